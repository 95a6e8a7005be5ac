use crate::*;
use content_inspector::ContentType;
use ed25519_dalek::ExpandedSecretKey;
use ed25519_dalek::PublicKey;
use ed25519_dalek::SecretKey;
use ed25519_dalek::Signature;
use num_enum::TryFromPrimitive;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::Deref;
use uuid::Uuid;

/// Transaction: register a voter, or update their profile
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RegisterVoterTransaction {
    pub voter: Address,
    pub profile: VoterProfile,
}

/// Transaction: unregister a voter
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnregisterVoterTransaction {
    pub voter: Address,
}

/// Transaction: add an option to a pending election's ballot
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AddBallotOptionTransaction {
    pub election: Uuid,
    pub option: BallotOption,
}

/// Transaction: cast (or recast) an encrypted ballot
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct VoteTransaction {
    pub election: Uuid,

    #[serde(with = "hex_serde")]
    pub encrypted_ballot: Vec<u8>,
}

/// Transaction: publish the tallies of a closed election
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PublishResultsTransaction {
    pub election: Uuid,
    pub tallies: Vec<u64>,
}

/// An unsigned transaction
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Transaction {
    RegisterVoter(RegisterVoterTransaction),
    UnregisterVoter(UnregisterVoterTransaction),
    CreateElection(ElectionConfig),
    AddBallotOption(AddBallotOptionTransaction),
    Vote(VoteTransaction),
    PublishResults(PublishResultsTransaction),
}

impl Transaction {
    /// Get the transaction type
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Transaction::RegisterVoter(_) => TransactionType::RegisterVoter,
            Transaction::UnregisterVoter(_) => TransactionType::UnregisterVoter,
            Transaction::CreateElection(_) => TransactionType::CreateElection,
            Transaction::AddBallotOption(_) => TransactionType::AddBallotOption,
            Transaction::Vote(_) => TransactionType::Vote,
            Transaction::PublishResults(_) => TransactionType::PublishResults,
        }
    }

    /// The election this transaction targets, if any
    pub fn election_id(&self) -> Option<Uuid> {
        match self {
            Transaction::RegisterVoter(_) | Transaction::UnregisterVoter(_) => None,
            Transaction::CreateElection(config) => Some(config.id),
            Transaction::AddBallotOption(tx) => Some(tx.election),
            Transaction::Vote(tx) => Some(tx.election),
            Transaction::PublishResults(tx) => Some(tx.election),
        }
    }

    /// Pack into the canonical bytes that get signed
    pub fn as_bytes(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_cbor::to_vec(self)?)
    }

    /// Unpack from JSON or CBOR
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        from_json_or_cbor(bytes)
    }
}

/// Decode a value from JSON or CBOR.
///
/// Small CBOR documents often contain no NUL byte and so inspect as UTF-8;
/// only text that opens a JSON object or array is parsed as JSON.
pub fn from_json_or_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    match content_inspector::inspect(bytes) {
        ContentType::UTF_8 | ContentType::UTF_8_BOM => {
            let text = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            match text.iter().find(|b| !b.is_ascii_whitespace()) {
                Some(b'{') | Some(b'[') => Ok(serde_json::from_slice(text)?),
                _ => Ok(serde_cbor::from_slice(bytes)?),
            }
        }
        ContentType::BINARY => Ok(serde_cbor::from_slice(bytes)?),
        _ => Err(Error::DeserializationUnknownFormat),
    }
}

/// A transaction type
#[derive(Serialize, Deserialize, TryFromPrimitive, Copy, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TransactionType {
    RegisterVoter = 1,
    UnregisterVoter = 2,
    CreateElection = 3,
    AddBallotOption = 4,
    Vote = 5,
    PublishResults = 6,
}

impl TransactionType {
    pub fn name(&self) -> &'static str {
        match self {
            TransactionType::RegisterVoter => "register_voter",
            TransactionType::UnregisterVoter => "unregister_voter",
            TransactionType::CreateElection => "create_election",
            TransactionType::AddBallotOption => "add_ballot_option",
            TransactionType::Vote => "vote",
            TransactionType::PublishResults => "publish_results",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A transaction signed with an ed25519 key.
///
/// The signer's public key is the caller's identity: once the signature
/// checks out, the transaction acts as `Address::from(public)`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Signed<T: Serialize> {
    pub tx: T,

    #[serde(with = "EdPublicKeyHex")]
    pub public: PublicKey,

    #[serde(with = "EdSignatureHex")]
    pub sig: Signature,
}

impl<T: Serialize> Signed<T> {
    /// Sign a transaction, producing a Signed<T>
    pub fn sign(secret: &SecretKey, transaction: T) -> Result<Self, Error> {
        let public = PublicKey::from(secret);
        let serialized = serde_cbor::to_vec(&transaction)?;

        let expanded: ExpandedSecretKey = secret.into();
        let sig = expanded.sign(&serialized, &public);

        Ok(Signed {
            tx: transaction,
            public,
            sig,
        })
    }

    /// Verify the signature, returning the address of the signer
    pub fn verify_signature(&self) -> Result<Address, Error> {
        let serialized = serde_cbor::to_vec(&self.tx)?;
        self.public.verify_strict(&serialized, &self.sig)?;

        Ok(self.signer())
    }

    /// Address of the key that claims to have signed this (unverified)
    pub fn signer(&self) -> Address {
        Address::from(&self.public)
    }

    /// Get the inner unsigned transaction
    pub fn inner(&self) -> &T {
        &self.tx
    }
}

impl<T: Serialize + DeserializeOwned> Signed<T> {
    /// Unpack from JSON or CBOR
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        from_json_or_cbor(bytes)
    }
}

impl<T: Serialize> AsRef<T> for Signed<T> {
    fn as_ref(&self) -> &T {
        &self.tx
    }
}

impl<T: Serialize> Deref for Signed<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}
