use crate::*;
use chrono::{DateTime, Utc};
use std::convert::TryFrom;

/// Where an election is in its lifecycle.
///
/// Never stored: always derived from the clock against the election's
/// `PhaseWindow`.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before the start time. Ballot options may still be added.
    Pending,
    /// Voting is open.
    Open,
    /// Voting is over. Ballots may be inspected and results published.
    Closed,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Phase::Pending => "pending",
            Phase::Open => "open",
            Phase::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// Voting window, the closed-open interval `[start_time, end_time)`
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(try_from = "UncheckedPhaseWindow")]
pub struct PhaseWindow {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

// Deserialized windows go through `PhaseWindow::new` like any other
#[derive(Deserialize)]
struct UncheckedPhaseWindow {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl TryFrom<UncheckedPhaseWindow> for PhaseWindow {
    type Error = Error;

    fn try_from(window: UncheckedPhaseWindow) -> Result<Self, Error> {
        PhaseWindow::new(window.start_time, window.end_time)
    }
}

impl PhaseWindow {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<Self, Error> {
        if start_time >= end_time {
            return Err(Error::InvalidPhaseWindow);
        }
        Ok(PhaseWindow {
            start_time,
            end_time,
        })
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn phase_at(&self, now: DateTime<Utc>) -> Phase {
        if now < self.start_time {
            Phase::Pending
        } else if now < self.end_time {
            Phase::Open
        } else {
            Phase::Closed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn boundaries_are_closed_open() {
        let window = PhaseWindow::new(at(100), at(200)).unwrap();

        assert_eq!(window.phase_at(at(0)), Phase::Pending);
        assert_eq!(window.phase_at(at(99)), Phase::Pending);
        assert_eq!(window.phase_at(at(100)), Phase::Open);
        assert_eq!(window.phase_at(at(199)), Phase::Open);
        assert_eq!(window.phase_at(at(200)), Phase::Closed);
        assert_eq!(window.phase_at(at(10_000)), Phase::Closed);
    }

    #[test]
    fn empty_or_inverted_window_is_rejected() {
        assert!(matches!(
            PhaseWindow::new(at(100), at(100)),
            Err(Error::InvalidPhaseWindow)
        ));
        assert!(matches!(
            PhaseWindow::new(at(200), at(100)),
            Err(Error::InvalidPhaseWindow)
        ));
    }

    #[test]
    fn deserialized_window_is_validated() {
        let inverted = r#"{"start_time":"2020-01-02T00:00:00Z","end_time":"2020-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<PhaseWindow>(inverted).is_err());

        let empty = r#"{"start_time":"2020-01-01T00:00:00Z","end_time":"2020-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<PhaseWindow>(empty).is_err());

        let window = PhaseWindow::new(at(100), at(200)).unwrap();
        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(serde_json::from_str::<PhaseWindow>(&json).unwrap(), window);
    }

    #[test]
    fn phase_display() {
        assert_eq!(format!("{}", Phase::Pending), "pending");
        assert_eq!(
            serde_json::to_string(&Phase::Closed).unwrap(),
            "\"closed\""
        );
    }
}
