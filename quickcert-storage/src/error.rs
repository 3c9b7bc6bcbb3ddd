//! Error types for the ledgers.

use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
///
/// Callers switch on the variant; messages are for humans only.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger has been closed or was never opened.
    #[error("currently not connected to the database")]
    NotConnected,

    /// The serial number is already provisioned.
    #[error("the s/n already exists: {0}")]
    AlreadyExists(String),

    /// At least one serial number in a bulk insert already exists.
    #[error("some s/ns already exist")]
    SomeAlreadyExist,

    /// Binding affected no row. Deliberately does not say which case applied.
    #[error("the s/n does not exist or has already been used")]
    NotFoundOrAlreadyBound,

    /// The serial number is not provisioned.
    #[error("the s/n does not exist: {0}")]
    NotFound(String),

    /// A permit for this device key already exists.
    #[error("a temporary permit already exists for this key")]
    PermitExists,

    /// A storage call exceeded its deadline.
    #[error("database call timed out")]
    Timeout,

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value failed validation on the way out.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The blocking worker running the query panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),
}

impl LedgerError {
    /// True for failures that mean the storage itself is unreachable, as
    /// opposed to an answer about the data.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Timeout | Self::Task(_))
    }
}
