//! Serial number ledger records.

use crate::key::DeviceKey;
use crate::serial::SerialNumber;
use serde::{Deserialize, Serialize};

/// One row of the serial number ledger.
///
/// `key` is `None` until a device binds the serial number, and after that
/// it can only ever be re-confirmed with the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub serial_number: SerialNumber,
    pub key: Option<DeviceKey>,
    pub note: Option<String>,
}

impl CertificateRecord {
    /// A freshly provisioned, unbound record.
    #[must_use]
    pub fn unbound(serial_number: SerialNumber) -> Self {
        Self {
            serial_number,
            key: None,
            note: None,
        }
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.key.is_some()
    }
}
