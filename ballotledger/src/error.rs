use crate::*;

use thiserror::Error;

/// Error types
///
/// Every variant reflects a precondition the caller violated (or a decoding
/// failure on input the caller supplied). None of them are retryable as-is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("ballotledger: caller is not authorized for this operation")]
    Unauthorized,

    #[error("ballotledger: operation requires the {expected} phase, election is {actual}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("ballotledger: caller is not a registered voter")]
    NotARegisteredVoter,

    #[error("ballotledger: voter is not registered")]
    NotRegistered,

    #[error("ballotledger: voter registry index is inconsistent")]
    RegistryInconsistent,

    #[error("ballotledger: not found")]
    NotFound,

    #[error("ballotledger: election {0} already exists")]
    ElectionExists(uuid::Uuid),

    #[error("ballotledger: election start time must be before its end time")]
    InvalidPhaseWindow,

    #[error("ballotledger: invalid identifier - invalid hexidecimal")]
    IdentifierBadHex,

    #[error("ballotledger: invalid identifier - wrong length")]
    IdentifierBadLen,

    #[error("ballotledger: signature error: {0}")]
    SignatureError(#[from] ed25519_dalek::SignatureError),

    #[error("ballotledger: CBOR error: {0}")]
    CBOR(#[from] serde_cbor::Error),

    #[error("ballotledger: JSON error: {0}")]
    JSON(#[from] serde_json::Error),

    #[error("ballotledger: error deserializing transaction: unknown format")]
    DeserializationUnknownFormat,

    #[error("ballotledger: lock poisoned by a panicking writer")]
    LockPoisoned,
}
