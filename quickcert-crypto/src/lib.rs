//! Key derivation and signing for QuickCert.
//!
//! - [`derive_device_key`]: fingerprint → permanent device key (SHA3-256)
//! - [`KeyMaterial`]: loads or generates the RSA signing key pair
//! - [`Signer`]: hash-then-sign with RSA-PSS
//! - [`SignatureVerifier`]: the offline check clients perform

mod derive;
mod error;
mod hash;
mod keys;
mod signing;

pub use derive::{derive_device_key, DERIVATION_SALT};
pub use error::{CryptoError, CryptoResult};
pub use hash::{HashAlgorithm, SaltLength};
pub use keys::{KeyMaterial, DEFAULT_KEY_BITS};
pub use signing::{Signature, SignatureVerifier, Signer};
