//! Error types for key handling and signing.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The private key PEM is unreadable or not a PKCS8 RSA key.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The public key PEM is unreadable or not an SPKI RSA key.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Hash algorithm name not recognised.
    #[error("unsupported hashing method: {0} (expected SHA-256, SHA-384, SHA-512, SHA3-256, SHA3-384 or SHA3-512)")]
    UnsupportedHash(String),

    /// PSS salt length mode not recognised.
    #[error("unsupported PSS salt length mode: {0} (expected hash-length or auto)")]
    UnsupportedSaltLength(String),

    /// RSA signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Signature does not match the message.
    #[error("signature verification failed")]
    InvalidSignature,

    /// Signature is not valid base64.
    #[error("invalid signature encoding: {0}")]
    InvalidSignatureEncoding(String),

    /// Key pair generation failed.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// IO error reading key files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
