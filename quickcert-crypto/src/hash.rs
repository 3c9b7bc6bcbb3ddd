//! Hash function and PSS salt length selection.
//!
//! Both are fixed for the lifetime of a deployment: external verifiers
//! hardcode them, so changing either invalidates every issued signature.

use crate::error::{CryptoError, CryptoResult};
use rsa::Pss;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_384, Sha3_512};
use std::fmt;
use std::str::FromStr;

/// Hash applied to a message before it is RSA-PSS signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl HashAlgorithm {
    /// Canonical configuration name, e.g. `SHA3-256`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
            Self::Sha3_256 => "SHA3-256",
            Self::Sha3_384 => "SHA3-384",
            Self::Sha3_512 => "SHA3-512",
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Sha3_256 => 32,
            Self::Sha384 | Self::Sha3_384 => 48,
            Self::Sha512 | Self::Sha3_512 => 64,
        }
    }

    /// Hashes `message`.
    #[must_use]
    pub fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(message).to_vec(),
            Self::Sha384 => Sha384::digest(message).to_vec(),
            Self::Sha512 => Sha512::digest(message).to_vec(),
            Self::Sha3_256 => Sha3_256::digest(message).to_vec(),
            Self::Sha3_384 => Sha3_384::digest(message).to_vec(),
            Self::Sha3_512 => Sha3_512::digest(message).to_vec(),
        }
    }

    pub(crate) fn pss(self, salt_len: usize) -> Pss {
        match self {
            Self::Sha256 => Pss::new_with_salt::<Sha256>(salt_len),
            Self::Sha384 => Pss::new_with_salt::<Sha384>(salt_len),
            Self::Sha512 => Pss::new_with_salt::<Sha512>(salt_len),
            Self::Sha3_256 => Pss::new_with_salt::<Sha3_256>(salt_len),
            Self::Sha3_384 => Pss::new_with_salt::<Sha3_384>(salt_len),
            Self::Sha3_512 => Pss::new_with_salt::<Sha3_512>(salt_len),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised names are an error, never a silent SHA-256 fallback.
impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> CryptoResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SHA-256" => Ok(Self::Sha256),
            "SHA-384" => Ok(Self::Sha384),
            "SHA-512" => Ok(Self::Sha512),
            "SHA3-256" => Ok(Self::Sha3_256),
            "SHA3-384" => Ok(Self::Sha3_384),
            "SHA3-512" => Ok(Self::Sha3_512),
            _ => Err(CryptoError::UnsupportedHash(s.to_string())),
        }
    }
}

impl TryFrom<String> for HashAlgorithm {
    type Error = CryptoError;

    fn try_from(s: String) -> CryptoResult<Self> {
        s.parse()
    }
}

impl From<HashAlgorithm> for String {
    fn from(alg: HashAlgorithm) -> Self {
        alg.name().to_string()
    }
}

/// PSS salt length policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SaltLength {
    /// Salt as long as the digest (what the client SDKs verify with).
    #[default]
    HashLength,
    /// Largest salt the modulus allows.
    Auto,
}

impl SaltLength {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HashLength => "hash-length",
            Self::Auto => "auto",
        }
    }

    /// Salt length in bytes for a key with a `modulus_bits`-bit modulus.
    #[must_use]
    pub fn resolve(self, hash: HashAlgorithm, modulus_bits: usize) -> usize {
        match self {
            Self::HashLength => hash.output_len(),
            Self::Auto => {
                let em_len = (modulus_bits.saturating_sub(1) + 7) / 8;
                em_len.saturating_sub(hash.output_len() + 2)
            }
        }
    }
}

impl fmt::Display for SaltLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SaltLength {
    type Err = CryptoError;

    fn from_str(s: &str) -> CryptoResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hash-length" | "equals-hash" => Ok(Self::HashLength),
            "auto" => Ok(Self::Auto),
            _ => Err(CryptoError::UnsupportedSaltLength(s.to_string())),
        }
    }
}

impl TryFrom<String> for SaltLength {
    type Error = CryptoError;

    fn try_from(s: String) -> CryptoResult<Self> {
        s.parse()
    }
}

impl From<SaltLength> for String {
    fn from(salt: SaltLength) -> Self {
        salt.name().to_string()
    }
}
