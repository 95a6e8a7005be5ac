use crate::*;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// An accepted transaction and the time it was applied
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub tx: Signed<Transaction>,
}

/// What an accepted transaction did
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_type: TransactionType,
    pub caller: Address,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub election: Option<Uuid>,
}

/// Point-in-time view of one election, for reporting
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ElectionSummary {
    pub id: Uuid,
    pub title: String,
    pub manager: Address,
    pub phase: Phase,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub ballot_options: Vec<BallotOption>,
    pub voters_who_voted: Vec<Address>,

    /// Only filled in once the election is closed
    pub results: Vec<u64>,
}

/// Point-in-time view of the whole ledger, for reporting
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LedgerSummary {
    pub at: DateTime<Utc>,
    pub registrar: Address,
    pub voters: Vec<Address>,
    pub elections: Vec<ElectionSummary>,
}

/// Signed-transaction front door to a registry and its elections.
///
/// Submissions are applied one at a time. The journal holds every accepted
/// transaction in the order it was applied; rejected transactions leave no
/// trace in it.
pub struct Ledger {
    directory: ElectionDirectory,
    clock: Arc<dyn Clock>,
    journal: Mutex<Vec<JournalEntry>>,
}

impl Ledger {
    /// Create an empty ledger whose registry is administered by `registrar`
    pub fn new(registrar: Address, clock: Arc<dyn Clock>) -> Self {
        let registry = SharedRegistry::new(VoterRegistry::new(registrar));
        Ledger {
            directory: ElectionDirectory::new(registry, clock.clone()),
            clock,
            journal: Mutex::new(vec![]),
        }
    }

    pub fn directory(&self) -> &ElectionDirectory {
        &self.directory
    }

    pub fn registry(&self) -> &SharedRegistry {
        self.directory.registry()
    }

    /// Verify and apply a signed transaction
    pub fn submit(&self, signed: &Signed<Transaction>) -> Result<Receipt, Error> {
        let mut journal = self.journal.lock().map_err(|_| Error::LockPoisoned)?;
        let tx_type = signed.transaction_type();

        let result = signed
            .verify_signature()
            .and_then(|caller| self.apply(caller, signed.inner()));

        match result {
            Ok(receipt) => {
                journal.push(JournalEntry {
                    at: self.clock.now(),
                    tx: signed.clone(),
                });
                debug!("accepted {} from {}", tx_type, receipt.caller);
                Ok(receipt)
            }
            Err(e) => {
                warn!("rejected {} from {}: {}", tx_type, signed.signer(), e);
                Err(e)
            }
        }
    }

    fn apply(&self, caller: Address, tx: &Transaction) -> Result<Receipt, Error> {
        match tx {
            Transaction::RegisterVoter(tx) => {
                self.registry()
                    .register_or_update(caller, tx.voter, tx.profile.clone())?;
            }
            Transaction::UnregisterVoter(tx) => {
                self.registry().unregister(caller, tx.voter)?;
            }
            Transaction::CreateElection(config) => {
                self.directory.create_election(caller, config.clone())?;
            }
            Transaction::AddBallotOption(tx) => {
                self.directory
                    .get_election(tx.election)?
                    .add_ballot_option(caller, tx.option.clone())?;
            }
            Transaction::Vote(tx) => {
                self.directory
                    .get_election(tx.election)?
                    .vote(caller, tx.encrypted_ballot.clone())?;
            }
            Transaction::PublishResults(tx) => {
                self.directory
                    .get_election(tx.election)?
                    .publish_results(caller, tx.tallies.clone())?;
            }
        }

        Ok(Receipt {
            transaction_type: tx.transaction_type(),
            caller,
            election: tx.election_id(),
        })
    }

    /// Every accepted transaction so far, in application order
    pub fn journal(&self) -> Result<Vec<JournalEntry>, Error> {
        Ok(self
            .journal
            .lock()
            .map_err(|_| Error::LockPoisoned)?
            .clone())
    }

    /// Rebuild a ledger by re-applying journal entries at their recorded times.
    ///
    /// Fails on the first entry that does not apply cleanly.
    pub fn replay(registrar: Address, entries: &[JournalEntry]) -> Result<Self, Error> {
        Ledger::replay_with(registrar, entries, |_, e| Err(e))
    }

    /// Like `replay`, but hands each rejection to `on_reject` along with the
    /// entry's position. Replay stops if `on_reject` returns an error.
    pub fn replay_with<F>(
        registrar: Address,
        entries: &[JournalEntry],
        mut on_reject: F,
    ) -> Result<Self, Error>
    where
        F: FnMut(usize, Error) -> Result<(), Error>,
    {
        let start = entries.first().map(|e| e.at).unwrap_or_else(Utc::now);
        let clock = ManualClock::new(start);
        let ledger = Ledger::new(registrar, Arc::new(clock.clone()));

        for (i, entry) in entries.iter().enumerate() {
            clock.set(entry.at);
            if let Err(e) = ledger.submit(&entry.tx) {
                on_reject(i, e)?;
            }
        }

        Ok(ledger)
    }

    /// Describe the registry and every election as of now
    pub fn summary(&self) -> Result<LedgerSummary, Error> {
        let registry = self.registry().snapshot()?;

        let mut elections = vec![];
        for handle in self.directory.list_elections()? {
            let summary = handle.read(|election, now| {
                let phase = election.phase(now);
                ElectionSummary {
                    id: election.id(),
                    title: election.title().to_owned(),
                    manager: election.manager(),
                    phase,
                    start_time: election.start_time(),
                    end_time: election.end_time(),
                    ballot_options: election.ballot_options().to_vec(),
                    voters_who_voted: election.voters_who_voted(),
                    results: election
                        .results(now)
                        .map(|r| r.to_vec())
                        .unwrap_or_default(),
                }
            })?;
            elections.push(summary);
        }

        Ok(LedgerSummary {
            at: self.clock.now(),
            registrar: registry.owner(),
            voters: registry.list_voters(),
            elections,
        })
    }
}
