//! Core type definitions for QuickCert.
//!
//! This crate defines the plain domain types shared by every other crate:
//! - Serial numbers and the records that bind them to devices
//! - Device fingerprints and the device keys derived from them
//! - Temporary permit durations and records
//! - An injectable clock so expiry logic can be tested without sleeping
//!
//! Nothing in here performs I/O or cryptography.

mod clock;
mod fingerprint;
mod key;
mod permit;
mod record;
mod serial;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fingerprint::{DeviceFingerprint, HardwareInfo, FIELD_SEPARATOR, TRIAL_PLACEHOLDER};
pub use key::{DeviceKey, DEVICE_KEY_HEX_LEN};
pub use permit::{PermitDuration, PermitTimeUnit, TemporaryPermit};
pub use record::CertificateRecord;
pub use serial::SerialNumber;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when constructing domain values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid device key: {0}")]
    InvalidDeviceKey(String),

    #[error("invalid serial number: {0}")]
    InvalidSerialNumber(String),

    #[error("invalid time unit: {0} (expected day, hour, minute or second)")]
    InvalidTimeUnit(String),

    #[error("invalid permit duration: {0}")]
    InvalidDuration(String),
}
