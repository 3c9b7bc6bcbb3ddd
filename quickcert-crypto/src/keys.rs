//! RSA key material.
//!
//! The private key is PEM-encoded PKCS8 and the public key PEM-encoded SPKI,
//! the same files the `init` command writes. A key that fails to parse is a
//! startup failure, never a per-request one.

use crate::error::{CryptoError, CryptoResult};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Modulus size used by `init`.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// The server's signing key pair.
#[derive(Clone)]
pub struct KeyMaterial {
    private: RsaPrivateKey,
}

impl KeyMaterial {
    /// Parses a PEM-encoded PKCS8 RSA private key.
    pub fn from_pkcs8_pem(pem: &str) -> CryptoResult<Self> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { private })
    }

    /// Reads and parses the private key file at `path`.
    pub fn load(path: &Path) -> CryptoResult<Self> {
        let pem = fs::read_to_string(path)?;
        Self::from_pkcs8_pem(&pem)
    }

    /// Generates a fresh key pair.
    pub fn generate(bits: usize) -> CryptoResult<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Ok(Self { private })
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private
    }

    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        self.private.to_public_key()
    }

    /// Modulus size in bits.
    #[must_use]
    pub fn modulus_bits(&self) -> usize {
        self.private.n().bits()
    }

    /// PKCS8 PEM of the private key.
    pub fn private_key_pem(&self) -> CryptoResult<String> {
        let pem = self
            .private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Ok(pem.as_str().to_owned())
    }

    /// SPKI PEM of the public key, the file distributed to clients.
    pub fn public_key_pem(&self) -> CryptoResult<String> {
        self.public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
    }

    /// Writes both PEM files. Fails if either file already exists.
    pub fn write_pem_files(&self, private_path: &Path, public_path: &Path) -> CryptoResult<()> {
        for path in [private_path, public_path] {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        write_new_file(private_path, self.private_key_pem()?.as_bytes(), 0o600)?;
        write_new_file(public_path, self.public_key_pem()?.as_bytes(), 0o644)?;
        Ok(())
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("modulus_bits", &self.modulus_bits())
            .finish_non_exhaustive()
    }
}

fn write_new_file(path: &Path, contents: &[u8], #[cfg_attr(not(unix), allow(unused_variables))] mode: u32) -> CryptoResult<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    Ok(())
}
