//! RSA-PSS signing of device keys and offline verification.
//!
//! The message is hashed with the configured [`HashAlgorithm`] and the
//! digest is signed with PSS using the same hash for MGF1. Verification
//! mirrors what client SDKs do with the distributed public key.

use crate::error::{CryptoError, CryptoResult};
use crate::hash::{HashAlgorithm, SaltLength};
use crate::keys::KeyMaterial;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::path::Path;

/// Raw RSA-PSS signature bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Standard (padded) base64, the form sent to clients.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        BASE64
            .decode(encoded)
            .map(Self)
            .map_err(|e| CryptoError::InvalidSignatureEncoding(e.to_string()))
    }
}

impl From<Vec<u8>> for Signature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Signs messages with the server's private key.
#[derive(Clone)]
pub struct Signer {
    key: RsaPrivateKey,
    hash: HashAlgorithm,
    salt_len: usize,
}

impl Signer {
    pub fn new(material: &KeyMaterial, hash: HashAlgorithm, salt: SaltLength) -> Self {
        Self {
            key: material.private_key().clone(),
            hash,
            salt_len: salt.resolve(hash, material.modulus_bits()),
        }
    }

    #[must_use]
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash
    }

    #[must_use]
    pub fn salt_len(&self) -> usize {
        self.salt_len
    }

    /// Hash-then-sign `message`.
    pub fn sign(&self, message: &[u8]) -> CryptoResult<Signature> {
        let digest = self.hash.digest(message);
        self.key
            .sign_with_rng(&mut OsRng, self.hash.pss(self.salt_len), &digest)
            .map(Signature)
            .map_err(|e| CryptoError::Signing(e.to_string()))
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("hash", &self.hash)
            .field("salt_len", &self.salt_len)
            .finish_non_exhaustive()
    }
}

/// Verifies signatures against the distributed public key.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: RsaPublicKey,
    hash: HashAlgorithm,
    salt_len: usize,
}

impl SignatureVerifier {
    pub fn new(key: RsaPublicKey, hash: HashAlgorithm, salt: SaltLength) -> Self {
        let salt_len = salt.resolve(hash, key.n().bits());
        Self { key, hash, salt_len }
    }

    /// Parses a PEM-encoded SPKI public key.
    pub fn from_public_key_pem(pem: &str, hash: HashAlgorithm, salt: SaltLength) -> CryptoResult<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self::new(key, hash, salt))
    }

    pub fn load(path: &Path, hash: HashAlgorithm, salt: SaltLength) -> CryptoResult<Self> {
        let pem = std::fs::read_to_string(path)?;
        Self::from_public_key_pem(&pem, hash, salt)
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> CryptoResult<()> {
        let digest = self.hash.digest(message);
        self.key
            .verify(self.hash.pss(self.salt_len), &digest, signature.as_bytes())
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Verifies a base64 signature as received from the server.
    pub fn verify_base64(&self, message: &[u8], signature_b64: &str) -> CryptoResult<()> {
        self.verify(message, &Signature::from_base64(signature_b64)?)
    }
}
