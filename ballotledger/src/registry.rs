use crate::*;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard};

/// Personal details of a voter.
///
/// Opaque to the ledger: nothing here is validated.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct VoterProfile {
    pub name: String,
    pub street_address: String,
    pub birthdate: String,
    pub person_id: String,
}

/// A voter the registry has seen at least once
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct VoterEntry {
    pub address: Address,

    /// True while the voter is eligible to vote
    pub is_active: bool,

    pub profile: VoterProfile,

    /// Position of `address` in the registry's enumeration list.
    ///
    /// Only meaningful while `is_active` is true.
    pub registry_index: usize,
}

/// The canonical list of eligible voters, owned by a single Registration Authority.
///
/// Active voters are kept in a dense list and every entry remembers its
/// position in that list, so removal is a constant-time swap-delete.
/// Unregistered voters keep their entry (with `is_active = false`) as history.
#[derive(Serialize, Clone, Debug)]
pub struct VoterRegistry {
    owner: Address,
    entries: HashMap<Address, VoterEntry>,
    enumeration: Vec<Address>,
}

impl VoterRegistry {
    /// Create an empty registry administered by `owner`
    pub fn new(owner: Address) -> Self {
        VoterRegistry {
            owner,
            entries: HashMap::new(),
            enumeration: Vec::new(),
        }
    }

    /// The Registration Authority
    pub fn owner(&self) -> Address {
        self.owner
    }

    fn require_owner(&self, caller: Address) -> Result<(), Error> {
        if caller != self.owner {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    /// Register a voter, or update the profile of an already registered one.
    ///
    /// Re-registering an active voter only replaces its profile. A previously
    /// unregistered voter is reactivated and appended to the enumeration list.
    pub fn register_or_update(
        &mut self,
        caller: Address,
        address: Address,
        profile: VoterProfile,
    ) -> Result<(), Error> {
        self.require_owner(caller)?;

        if let Some(entry) = self.entries.get_mut(&address).filter(|e| e.is_active) {
            entry.profile = profile;
            info!("updated voter {}", address);
            return Ok(());
        }

        let registry_index = self.enumeration.len();
        self.enumeration.push(address);
        self.entries.insert(
            address,
            VoterEntry {
                address,
                is_active: true,
                profile,
                registry_index,
            },
        );
        info!("registered voter {} at index {}", address, registry_index);

        Ok(())
    }

    /// Remove a voter from the active list in O(1).
    ///
    /// The last voter in the enumeration list takes the removed voter's slot,
    /// so enumeration order is not preserved.
    pub fn unregister(&mut self, caller: Address, address: Address) -> Result<(), Error> {
        self.require_owner(caller)?;

        let index = match self.entries.get(&address) {
            Some(entry) if entry.is_active => entry.registry_index,
            _ => return Err(Error::NotRegistered),
        };
        if self.enumeration.get(index) != Some(&address) {
            error!("registry index {} does not point at voter {}", index, address);
            return Err(Error::RegistryInconsistent);
        }

        // When `index` is the last slot this is a plain pop and nothing moves.
        self.enumeration.swap_remove(index);
        if let Some(moved) = self.enumeration.get(index).copied() {
            if let Some(moved_entry) = self.entries.get_mut(&moved) {
                moved_entry.registry_index = index;
            }
        }

        if let Some(entry) = self.entries.get_mut(&address) {
            entry.is_active = false;
        }
        info!("unregistered voter {}", address);

        Ok(())
    }

    /// True if `address` is registered and active. Unknown addresses are simply not voters.
    pub fn is_voter(&self, address: &Address) -> bool {
        self.entries
            .get(address)
            .map(|entry| entry.is_active)
            .unwrap_or(false)
    }

    /// Number of active voters
    pub fn count(&self) -> usize {
        self.enumeration.len()
    }

    /// Snapshot of all active voters, in no particular order
    pub fn list_voters(&self) -> Vec<Address> {
        self.enumeration.clone()
    }

    /// Look up a voter, active or not
    pub fn get_details(&self, address: &Address) -> Result<&VoterEntry, Error> {
        self.entries.get(address).ok_or(Error::NotFound)
    }
}

/// A `VoterRegistry` shared by reference between every election of a directory.
///
/// Writers take the registry lock exclusively; readers may proceed in parallel.
#[derive(Clone, Debug)]
pub struct SharedRegistry(Arc<RwLock<VoterRegistry>>);

impl SharedRegistry {
    pub fn new(registry: VoterRegistry) -> Self {
        SharedRegistry(Arc::new(RwLock::new(registry)))
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, VoterRegistry>, Error> {
        read_lock(&self.0)
    }

    pub fn owner(&self) -> Result<Address, Error> {
        Ok(self.read()?.owner())
    }

    pub fn register_or_update(
        &self,
        caller: Address,
        address: Address,
        profile: VoterProfile,
    ) -> Result<(), Error> {
        write_lock(&self.0)?.register_or_update(caller, address, profile)
    }

    pub fn unregister(&self, caller: Address, address: Address) -> Result<(), Error> {
        write_lock(&self.0)?.unregister(caller, address)
    }

    pub fn is_voter(&self, address: &Address) -> Result<bool, Error> {
        Ok(self.read()?.is_voter(address))
    }

    pub fn count(&self) -> Result<usize, Error> {
        Ok(self.read()?.count())
    }

    pub fn list_voters(&self) -> Result<Vec<Address>, Error> {
        Ok(self.read()?.list_voters())
    }

    pub fn get_details(&self, address: &Address) -> Result<VoterEntry, Error> {
        self.read()?.get_details(address).cloned()
    }

    /// Clone the whole registry under a single read lock
    pub fn snapshot(&self) -> Result<VoterRegistry, Error> {
        Ok(self.read()?.clone())
    }
}
