//! Device key derivation.
//!
//! `key = hex(SHA3-256(fingerprint || "SALT"))`
//!
//! Keys are permanent identifiers: the cache treats a miss as "derive it
//! again", so this function must stay pure and deterministic forever. Never
//! add randomness, time, or configuration to it.

use quickcert_types::{DeviceFingerprint, DeviceKey};
use sha3::{Digest, Sha3_256};

/// Fixed suffix appended before hashing. Namespaces the digest; not a secret.
pub const DERIVATION_SALT: &str = "SALT";

/// Derives the device key for a fingerprint.
#[must_use]
pub fn derive_device_key(fingerprint: &DeviceFingerprint) -> DeviceKey {
    let mut hasher = Sha3_256::new();
    hasher.update(fingerprint.as_str().as_bytes());
    hasher.update(DERIVATION_SALT.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    DeviceKey::from_digest(&digest)
}
