use crate::*;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

/// Everything needed to create an election
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ElectionConfig {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,

    /// Reference to the key ballots are encrypted to.
    ///
    /// Opaque here; only the external tally process knows what it means.
    pub encryption_key: String,
}

impl ElectionConfig {
    /// Create a new ElectionConfig with a freshly generated id
    pub fn new(
        title: &str,
        description: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        encryption_key: &str,
    ) -> Self {
        ElectionConfig {
            id: Uuid::new_v4(),
            title: title.to_owned(),
            description: description.to_owned(),
            start_time,
            end_time,
            encryption_key: encryption_key.to_owned(),
        }
    }
}

/// One choice on the ballot
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BallotOption {
    pub label: String,
    pub description: String,
}

impl BallotOption {
    pub fn new(label: &str, description: &str) -> Self {
        BallotOption {
            label: label.to_owned(),
            description: description.to_owned(),
        }
    }
}

/// The latest ballot cast by a voter.
///
/// Votes are revocable: casting again replaces the ballot and bumps `revision`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VoteRecord {
    #[serde(with = "hex_serde")]
    pub encrypted_ballot: Vec<u8>,

    /// When the current ballot was cast
    pub cast_at: DateTime<Utc>,

    /// How many times this voter has cast a ballot
    pub revision: u32,
}

/// A single time-bounded ballot.
///
/// Every operation takes the current time and the caller explicitly and
/// re-derives the phase on each call. Checks run before any mutation, so a
/// rejected call leaves the election untouched.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Election {
    id: Uuid,
    title: String,
    description: String,

    /// Election Manager, the only caller allowed to configure this election or publish its results
    manager: Address,

    encryption_key: String,
    window: PhaseWindow,
    ballot_options: Vec<BallotOption>,

    /// Insertion order is first-vote order; the keys double as the list of voters who voted
    vote_ledger: IndexMap<Address, VoteRecord>,

    published_result: Vec<u64>,
    published_at: Option<DateTime<Utc>>,
}

impl Election {
    /// Create a new election managed by `manager`
    pub fn new(manager: Address, config: ElectionConfig) -> Result<Self, Error> {
        let window = PhaseWindow::new(config.start_time, config.end_time)?;

        Ok(Election {
            id: config.id,
            title: config.title,
            description: config.description,
            manager,
            encryption_key: config.encryption_key,
            window,
            ballot_options: vec![],
            vote_ledger: IndexMap::new(),
            published_result: vec![],
            published_at: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn manager(&self) -> Address {
        self.manager
    }

    pub fn encryption_key(&self) -> &str {
        &self.encryption_key
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.window.start_time()
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.window.end_time()
    }

    pub fn phase(&self, now: DateTime<Utc>) -> Phase {
        self.window.phase_at(now)
    }

    fn require_phase(&self, expected: Phase, now: DateTime<Utc>) -> Result<(), Error> {
        let actual = self.phase(now);
        if actual != expected {
            return Err(Error::WrongPhase { expected, actual });
        }
        Ok(())
    }

    fn require_manager(&self, caller: Address) -> Result<(), Error> {
        if caller != self.manager {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    /// Append a ballot option. Only allowed before voting starts.
    ///
    /// Returns the index of the new option.
    pub fn add_ballot_option(
        &mut self,
        caller: Address,
        option: BallotOption,
        now: DateTime<Utc>,
    ) -> Result<usize, Error> {
        self.require_phase(Phase::Pending, now)?;
        self.require_manager(caller)?;

        info!(
            "election {}: added ballot option '{}'",
            self.id, option.label
        );
        self.ballot_options.push(option);

        Ok(self.ballot_options.len() - 1)
    }

    pub fn ballot_options(&self) -> &[BallotOption] {
        &self.ballot_options
    }

    /// Cast (or recast) a ballot.
    ///
    /// The encrypted ballot is stored as-is. A voter who votes again replaces
    /// their earlier ballot; only the latest one counts. Returns the record's
    /// revision.
    pub fn vote(
        &mut self,
        registry: &VoterRegistry,
        caller: Address,
        encrypted_ballot: Vec<u8>,
        now: DateTime<Utc>,
    ) -> Result<u32, Error> {
        self.require_phase(Phase::Open, now)?;
        if !registry.is_voter(&caller) {
            return Err(Error::NotARegisteredVoter);
        }

        // First vote appends to the ledger; later ones overwrite in place.
        let record = self.vote_ledger.entry(caller).or_insert_with(|| VoteRecord {
            encrypted_ballot: vec![],
            cast_at: now,
            revision: 0,
        });
        record.encrypted_ballot = encrypted_ballot;
        record.cast_at = now;
        record.revision = record.revision.saturating_add(1);
        let revision = record.revision;

        info!(
            "election {}: vote from {} (revision {})",
            self.id, caller, revision
        );

        Ok(revision)
    }

    /// True if `address` has cast at least one ballot
    pub fn has_voted(&self, address: &Address) -> bool {
        self.vote_ledger.contains_key(address)
    }

    /// Every voter who has cast a ballot, each once, in first-vote order
    pub fn voters_who_voted(&self) -> Vec<Address> {
        self.vote_ledger.keys().copied().collect()
    }

    /// The latest encrypted ballot of `address`. Manager only, after voting ends.
    pub fn encrypted_ballot(
        &self,
        caller: Address,
        address: &Address,
        now: DateTime<Utc>,
    ) -> Result<&[u8], Error> {
        self.require_phase(Phase::Closed, now)?;
        self.require_manager(caller)?;

        self.vote_ledger
            .get(address)
            .map(|record| record.encrypted_ballot.as_slice())
            .ok_or(Error::NotFound)
    }

    /// Publish tallies computed by the external tally process.
    ///
    /// Stored verbatim. Publishing again replaces the previous publication.
    pub fn publish_results(
        &mut self,
        caller: Address,
        tallies: Vec<u64>,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.require_phase(Phase::Closed, now)?;
        self.require_manager(caller)?;

        if self.published_at.is_some() {
            warn!("election {}: replacing previously published results", self.id);
        }
        info!("election {}: published results {:?}", self.id, tallies);
        self.published_result = tallies;
        self.published_at = Some(now);

        Ok(())
    }

    /// Published tallies, empty until the manager publishes
    pub fn results(&self, now: DateTime<Utc>) -> Result<&[u64], Error> {
        self.require_phase(Phase::Closed, now)?;
        Ok(&self.published_result)
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const START: i64 = 1_000;
    const END: i64 = 2_000;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn addr(n: u8) -> Address {
        Address::from([n; ADDRESS_LEN])
    }

    fn manager() -> Address {
        addr(200)
    }

    fn setup() -> (Election, VoterRegistry) {
        let config = ElectionConfig::new("Board", "Annual board election", at(START), at(END), "key");
        let election = Election::new(manager(), config).unwrap();

        let registrar = addr(0);
        let mut registry = VoterRegistry::new(registrar);
        for n in 1..=3u8 {
            registry
                .register_or_update(registrar, addr(n), VoterProfile::default())
                .unwrap();
        }

        (election, registry)
    }

    #[test]
    fn create_new_election() {
        let (election, _) = setup();
        assert_eq!(election.title(), "Board");
        assert_eq!(election.description(), "Annual board election");
        assert_eq!(election.manager(), manager());
        assert_eq!(election.encryption_key(), "key");
        assert_eq!(election.start_time(), at(START));
        assert_eq!(election.end_time(), at(END));
        assert_eq!(election.phase(at(START - 1)), Phase::Pending);
        assert!(election.ballot_options().is_empty());

        let bad = ElectionConfig::new("Bad", "", at(END), at(START), "key");
        assert!(matches!(
            Election::new(manager(), bad),
            Err(Error::InvalidPhaseWindow)
        ));
    }

    #[test]
    fn ballot_options_freeze_at_start() {
        let (mut election, _) = setup();

        let index = election
            .add_ballot_option(manager(), BallotOption::new("X", "first"), at(START - 1))
            .unwrap();
        assert_eq!(index, 0);

        let err = election
            .add_ballot_option(manager(), BallotOption::new("Y", "late"), at(START))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::WrongPhase {
                expected: Phase::Pending,
                actual: Phase::Open
            }
        ));
        assert!(election
            .add_ballot_option(manager(), BallotOption::new("Y", "late"), at(END))
            .is_err());

        assert_eq!(election.ballot_options(), &[BallotOption::new("X", "first")]);
    }

    #[test]
    fn vote_outside_window_is_rejected() {
        let (mut election, registry) = setup();

        for now in &[at(START - 1), at(END), at(END + 500)] {
            let err = election
                .vote(&registry, addr(1), b"ballot".to_vec(), *now)
                .unwrap_err();
            assert!(matches!(
                err,
                Error::WrongPhase {
                    expected: Phase::Open,
                    ..
                }
            ));
        }
        assert!(!election.has_voted(&addr(1)));
        assert!(election.voters_who_voted().is_empty());

        assert_eq!(
            election
                .vote(&registry, addr(1), b"ballot".to_vec(), at(START))
                .unwrap(),
            1
        );
        assert!(election
            .vote(&registry, addr(2), b"ballot".to_vec(), at(END - 1))
            .is_ok());
    }

    #[test]
    fn phase_is_checked_before_registration() {
        let (mut election, registry) = setup();
        let stranger = addr(99);

        assert!(matches!(
            election.vote(&registry, stranger, vec![1], at(START - 1)),
            Err(Error::WrongPhase { .. })
        ));
        assert!(matches!(
            election.vote(&registry, stranger, vec![1], at(START)),
            Err(Error::NotARegisteredVoter)
        ));
        assert!(!election.has_voted(&stranger));
    }

    #[test]
    fn revote_replaces_ballot() {
        let (mut election, registry) = setup();

        election
            .vote(&registry, addr(1), b"first".to_vec(), at(START))
            .unwrap();
        election
            .vote(&registry, addr(2), b"other".to_vec(), at(START + 1))
            .unwrap();
        let revision = election
            .vote(&registry, addr(1), b"second".to_vec(), at(START + 2))
            .unwrap();
        assert_eq!(revision, 2);

        assert_eq!(election.voters_who_voted(), vec![addr(1), addr(2)]);

        assert_eq!(
            election
                .encrypted_ballot(manager(), &addr(1), at(END))
                .unwrap(),
            b"second"
        );
        assert!(matches!(
            election.encrypted_ballot(manager(), &addr(3), at(END)),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn closed_phase_operations_are_gated() {
        let (mut election, registry) = setup();
        election
            .vote(&registry, addr(1), b"ballot".to_vec(), at(START))
            .unwrap();

        // Still open
        assert!(matches!(
            election.encrypted_ballot(manager(), &addr(1), at(END - 1)),
            Err(Error::WrongPhase { .. })
        ));
        assert!(matches!(
            election.publish_results(manager(), vec![1], at(END - 1)),
            Err(Error::WrongPhase { .. })
        ));
        assert!(matches!(
            election.results(at(END - 1)),
            Err(Error::WrongPhase { .. })
        ));

        // Closed, but not the manager
        assert!(matches!(
            election.encrypted_ballot(addr(1), &addr(1), at(END)),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            election.publish_results(addr(1), vec![9], at(END)),
            Err(Error::Unauthorized)
        ));
        assert!(election.results(at(END)).unwrap().is_empty());
        assert!(election.published_at().is_none());
    }

    #[test]
    fn non_manager_cannot_add_options() {
        let (mut election, _) = setup();
        assert!(matches!(
            election.add_ballot_option(addr(1), BallotOption::new("X", ""), at(0)),
            Err(Error::Unauthorized)
        ));
        assert!(election.ballot_options().is_empty());
    }

    #[test]
    fn republishing_replaces_results() {
        let (mut election, _) = setup();

        election
            .publish_results(manager(), vec![1, 2], at(END))
            .unwrap();
        election
            .publish_results(manager(), vec![3, 0], at(END + 10))
            .unwrap();

        assert_eq!(election.results(at(END + 20)).unwrap(), &[3, 0]);
        assert_eq!(election.published_at(), Some(at(END + 10)));
    }

    #[test]
    fn revision_saturates() {
        let (mut election, registry) = setup();
        election
            .vote(&registry, addr(1), b"first".to_vec(), at(START))
            .unwrap();
        election.vote_ledger[&addr(1)].revision = u32::MAX;

        let revision = election
            .vote(&registry, addr(1), b"again".to_vec(), at(START + 1))
            .unwrap();
        assert_eq!(revision, u32::MAX);
        assert_eq!(election.vote_ledger[&addr(1)].encrypted_ballot, b"again");
    }

    #[test]
    fn deserialized_election_keeps_a_valid_window() {
        let (election, _) = setup();
        let mut json = serde_json::to_value(&election).unwrap();
        let restored: Election = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(restored.phase(at(START)), Phase::Open);

        json["window"]["end_time"] = json["window"]["start_time"].clone();
        assert!(serde_json::from_value::<Election>(json).is_err());
    }
}
