//! Device fingerprints.
//!
//! A fingerprint is the canonical string
//! `serial&board_producer&board_name&mac_address&` (note the trailing
//! separator). It is both the cache key and the input to key derivation, so
//! its format can never change once keys have been issued.
//!
//! Components are used verbatim: no trimming, no case folding.

use crate::serial::SerialNumber;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator placed after every fingerprint component.
pub const FIELD_SEPARATOR: char = '&';

/// Stand-in for the serial number slot of trial fingerprints.
///
/// [`SerialNumber`] refuses this value, so a trial fingerprint can never
/// collide with a purchased-device fingerprint.
pub const TRIAL_PLACEHOLDER: &str = "_";

/// Hardware attributes reported by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HardwareInfo {
    /// Motherboard manufacturer.
    pub board_producer: String,
    /// Motherboard model.
    pub board_name: String,
    /// Ethernet MAC address.
    pub mac_address: String,
}

impl HardwareInfo {
    pub fn new(
        board_producer: impl Into<String>,
        board_name: impl Into<String>,
        mac_address: impl Into<String>,
    ) -> Self {
        Self {
            board_producer: board_producer.into(),
            board_name: board_name.into(),
            mac_address: mac_address.into(),
        }
    }
}

/// Canonical identity string of a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceFingerprint(String);

impl DeviceFingerprint {
    /// Fingerprint of a device applying for a certificate under `serial`.
    #[must_use]
    pub fn for_serial(serial: &SerialNumber, hardware: &HardwareInfo) -> Self {
        Self::compose(serial.as_str(), hardware)
    }

    /// Fingerprint of a device applying for a trial permit.
    #[must_use]
    pub fn for_trial(hardware: &HardwareInfo) -> Self {
        Self::compose(TRIAL_PLACEHOLDER, hardware)
    }

    fn compose(slot: &str, hardware: &HardwareInfo) -> Self {
        let parts = [
            slot,
            hardware.board_producer.as_str(),
            hardware.board_name.as_str(),
            hardware.mac_address.as_str(),
        ];
        let mut canonical = String::with_capacity(parts.iter().map(|p| p.len() + 1).sum());
        for part in parts {
            canonical.push_str(part);
            canonical.push(FIELD_SEPARATOR);
        }
        Self(canonical)
    }

    /// Returns the canonical string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
