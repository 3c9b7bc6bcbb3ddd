//! Ledgers for QuickCert.
//!
//! Two durable stores sit behind traits so the issuance service never sees
//! the storage engine:
//! - [`SerialNumberLedger`]: provisioned serial numbers and their one-time
//!   device binding
//! - [`TemporaryPermitLedger`]: trial permits with a fixed expiry
//!
//! [`SqliteLedger`] implements both on a single SQLite database.
//!
//! # Atomicity
//!
//! - Binding is one `UPDATE .. WHERE key IS NULL OR key = ?` whose affected
//!   row count decides the outcome, so concurrent binds have one winner.
//! - Permit creation is `INSERT OR IGNORE`; a zero row count reports
//!   `PermitExists` instead of overwriting.
//! - Bulk provisioning runs in one transaction.

mod error;
mod ledger;
mod sqlite;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{PermitLookup, SerialNumberLedger, TemporaryPermitLedger};
pub use sqlite::SqliteLedger;
