//! Shared test helpers for crypto tests.

#![allow(dead_code)]

use quickcert_crypto::KeyMaterial;

/// Fixed 2048-bit RSA key pair so tests never pay for key generation.
pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../../../testdata/rsa_private_key.pem");
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../../../testdata/rsa_public_key.pem");
/// A valid PKCS8 key that is not RSA.
pub const ED25519_PRIVATE_KEY_PEM: &str = include_str!("../../../testdata/ed25519_private_key.pem");

pub fn test_key_material() -> KeyMaterial {
    KeyMaterial::from_pkcs8_pem(TEST_PRIVATE_KEY_PEM).unwrap()
}
