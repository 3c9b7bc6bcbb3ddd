//! Error taxonomy of the issuance service.

use quickcert_crypto::CryptoError;
use quickcert_storage::LedgerError;
use std::fmt;
use thiserror::Error;

/// Result type for issuance operations.
pub type IssuanceResult<T> = Result<T, IssuanceError>;

/// External dependency that failed to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Cache,
    Storage,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cache => "cache",
            Self::Storage => "database",
        })
    }
}

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client-supplied data rejected before any side effect.
    Validation,
    /// Unknown serial number.
    NotFound,
    /// Binding refused, or a serial number collides on provisioning.
    Conflict,
    /// Cache or storage unreachable or too slow.
    Connectivity,
    /// Anything else; a bug or corrupted data.
    Internal,
}

/// Errors returned by the issuance service.
#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("the s/n does not exist: {0}")]
    SerialNumberNotFound(String),

    /// Intentionally identical for "unknown" and "bound to another device".
    #[error("the s/n does not exist or has already been used")]
    NotFoundOrAlreadyBound,

    #[error("the s/n already exists: {0}")]
    SerialNumberExists(String),

    #[error("some s/ns already exist")]
    SomeSerialNumbersExist,

    #[error("{dependency} unavailable: {reason}")]
    Connectivity { dependency: Dependency, reason: String },

    #[error("signing failed: {0}")]
    Signing(#[from] CryptoError),

    #[error("storage error: {0}")]
    Storage(LedgerError),
}

impl IssuanceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::SerialNumberNotFound(_) => ErrorKind::NotFound,
            Self::NotFoundOrAlreadyBound
            | Self::SerialNumberExists(_)
            | Self::SomeSerialNumbersExist => ErrorKind::Conflict,
            Self::Connectivity { .. } => ErrorKind::Connectivity,
            Self::Signing(_) | Self::Storage(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn cache(reason: impl fmt::Display) -> Self {
        Self::Connectivity {
            dependency: Dependency::Cache,
            reason: reason.to_string(),
        }
    }
}

impl From<LedgerError> for IssuanceError {
    fn from(err: LedgerError) -> Self {
        if err.is_connectivity() {
            return Self::Connectivity {
                dependency: Dependency::Storage,
                reason: err.to_string(),
            };
        }
        match err {
            LedgerError::NotFoundOrAlreadyBound => Self::NotFoundOrAlreadyBound,
            LedgerError::NotFound(sn) => Self::SerialNumberNotFound(sn),
            LedgerError::AlreadyExists(sn) => Self::SerialNumberExists(sn),
            LedgerError::SomeAlreadyExist => Self::SomeSerialNumbersExist,
            other => Self::Storage(other),
        }
    }
}
