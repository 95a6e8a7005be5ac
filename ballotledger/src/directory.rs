use crate::*;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Shared, lockable handle to one election.
///
/// Each operation reads the clock after taking the election lock, so the
/// phase it sees cannot change underneath it. `vote` also holds the registry
/// read lock for its whole duration; locks are always taken election first,
/// registry second.
#[derive(Clone)]
pub struct ElectionHandle {
    id: Uuid,
    election: Arc<RwLock<Election>>,
    registry: SharedRegistry,
    clock: Arc<dyn Clock>,
}

impl ElectionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run `f` against the election under a read lock
    pub fn read<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&Election, DateTime<Utc>) -> R,
    {
        let election = read_lock(&self.election)?;
        let now = self.clock.now();
        Ok(f(&election, now))
    }

    /// Clone the election as it is right now
    pub fn snapshot(&self) -> Result<Election, Error> {
        self.read(|election, _| election.clone())
    }

    pub fn phase(&self) -> Result<Phase, Error> {
        self.read(|election, now| election.phase(now))
    }

    pub fn manager(&self) -> Result<Address, Error> {
        self.read(|election, _| election.manager())
    }

    pub fn add_ballot_option(&self, caller: Address, option: BallotOption) -> Result<usize, Error> {
        let mut election = write_lock(&self.election)?;
        let now = self.clock.now();
        election.add_ballot_option(caller, option, now)
    }

    pub fn ballot_options(&self) -> Result<Vec<BallotOption>, Error> {
        self.read(|election, _| election.ballot_options().to_vec())
    }

    pub fn vote(&self, caller: Address, encrypted_ballot: Vec<u8>) -> Result<u32, Error> {
        let mut election = write_lock(&self.election)?;
        let registry = self.registry.read()?;
        let now = self.clock.now();
        election.vote(&registry, caller, encrypted_ballot, now)
    }

    pub fn has_voted(&self, address: &Address) -> Result<bool, Error> {
        self.read(|election, _| election.has_voted(address))
    }

    pub fn voters_who_voted(&self) -> Result<Vec<Address>, Error> {
        self.read(|election, _| election.voters_who_voted())
    }

    pub fn encrypted_ballot(&self, caller: Address, address: &Address) -> Result<Vec<u8>, Error> {
        self.read(|election, now| {
            election
                .encrypted_ballot(caller, address, now)
                .map(|ballot| ballot.to_vec())
        })?
    }

    pub fn publish_results(&self, caller: Address, tallies: Vec<u64>) -> Result<(), Error> {
        let mut election = write_lock(&self.election)?;
        let now = self.clock.now();
        election.publish_results(caller, tallies, now)
    }

    pub fn results(&self) -> Result<Vec<u64>, Error> {
        self.read(|election, now| election.results(now).map(|r| r.to_vec()))?
    }
}

impl std::fmt::Debug for ElectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ElectionHandle({})", self.id)
    }
}

/// Creates elections bound to one shared voter registry, and keeps track of them
pub struct ElectionDirectory {
    registry: SharedRegistry,
    clock: Arc<dyn Clock>,
    elections: RwLock<IndexMap<Uuid, ElectionHandle>>,
}

impl ElectionDirectory {
    pub fn new(registry: SharedRegistry, clock: Arc<dyn Clock>) -> Self {
        ElectionDirectory {
            registry,
            clock,
            elections: RwLock::new(IndexMap::new()),
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Create an election. `manager` becomes its Election Manager.
    pub fn create_election(
        &self,
        manager: Address,
        config: ElectionConfig,
    ) -> Result<ElectionHandle, Error> {
        let mut elections = write_lock(&self.elections)?;
        if elections.contains_key(&config.id) {
            return Err(Error::ElectionExists(config.id));
        }

        let election = Election::new(manager, config)?;
        let handle = ElectionHandle {
            id: election.id(),
            election: Arc::new(RwLock::new(election)),
            registry: self.registry.clone(),
            clock: self.clock.clone(),
        };
        elections.insert(handle.id, handle.clone());
        info!("created election {} managed by {}", handle.id, manager);

        Ok(handle)
    }

    /// All elections, in creation order
    pub fn list_elections(&self) -> Result<Vec<ElectionHandle>, Error> {
        Ok(read_lock(&self.elections)?.values().cloned().collect())
    }

    pub fn get_election(&self, id: Uuid) -> Result<ElectionHandle, Error> {
        read_lock(&self.elections)?
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn addr(n: u8) -> Address {
        Address::from([n; ADDRESS_LEN])
    }

    #[test]
    fn create_and_list_elections() {
        let clock = ManualClock::new(at(0));
        let registry = SharedRegistry::new(VoterRegistry::new(addr(0)));
        let directory = ElectionDirectory::new(registry, Arc::new(clock));

        let first = ElectionConfig::new("First", "", at(10), at(20), "k1");
        let second = ElectionConfig::new("Second", "", at(10), at(20), "k2");
        let first_id = first.id;

        let handle = directory.create_election(addr(1), first.clone()).unwrap();
        directory.create_election(addr(2), second).unwrap();

        assert_eq!(handle.id(), first_id);
        assert_eq!(handle.manager().unwrap(), addr(1));
        assert_eq!(handle.phase().unwrap(), Phase::Pending);

        let titles: Vec<String> = directory
            .list_elections()
            .unwrap()
            .iter()
            .map(|h| h.read(|e, _| e.title().to_owned()).unwrap())
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);

        assert!(matches!(
            directory.create_election(addr(1), first),
            Err(Error::ElectionExists(id)) if id == first_id
        ));
        assert!(matches!(
            directory.get_election(Uuid::new_v4()),
            Err(Error::NotFound)
        ));
        assert_eq!(directory.get_election(first_id).unwrap().id(), first_id);
    }

    #[test]
    fn elections_share_registry_and_clock() {
        let registrar = addr(0);
        let clock = ManualClock::new(at(0));
        let registry = SharedRegistry::new(VoterRegistry::new(registrar));
        let directory = ElectionDirectory::new(registry.clone(), Arc::new(clock.clone()));

        let a = directory
            .create_election(addr(1), ElectionConfig::new("A", "", at(10), at(20), "k"))
            .unwrap();
        let b = directory
            .create_election(addr(1), ElectionConfig::new("B", "", at(10), at(20), "k"))
            .unwrap();

        registry
            .register_or_update(registrar, addr(5), VoterProfile::default())
            .unwrap();
        clock.set(at(15));

        a.vote(addr(5), vec![1]).unwrap();
        b.vote(addr(5), vec![2]).unwrap();

        directory
            .registry()
            .unregister(registrar, addr(5))
            .unwrap();
        assert!(matches!(
            a.vote(addr(5), vec![3]),
            Err(Error::NotARegisteredVoter)
        ));

        clock.set(at(20));
        assert_eq!(a.encrypted_ballot(addr(1), &addr(5)).unwrap(), vec![1]);
        assert_eq!(b.encrypted_ballot(addr(1), &addr(5)).unwrap(), vec![2]);
    }
}
