//! Certificate and temporary permit issuance.

use crate::cache::{CacheError, DeviceKeyCache, DEFAULT_CACHE_TTL};
use crate::error::{IssuanceError, IssuanceResult};
use quickcert_crypto::{derive_device_key, Signer};
use quickcert_storage::{LedgerError, LedgerResult, PermitLookup, SerialNumberLedger, TemporaryPermitLedger};
use quickcert_types::{DeviceFingerprint, DeviceKey, HardwareInfo, SerialNumber};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on a single cache or storage call.
pub const DEFAULT_DEPENDENCY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables for [`IssuanceService`].
#[derive(Debug, Clone, Copy)]
pub struct IssuanceConfig {
    /// TTL applied to cache writes.
    pub cache_ttl: chrono::Duration,
    /// Upper bound on every cache and storage call.
    pub dependency_timeout: Duration,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            dependency_timeout: DEFAULT_DEPENDENCY_TIMEOUT,
        }
    }
}

/// A device key bound to a serial number, signed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    pub key: DeviceKey,
    /// Base64 (standard alphabet, padded) RSA-PSS signature over `key`.
    pub signature: String,
}

/// Outcome of a temporary permit application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermitStatus {
    /// The permit is live for this many more seconds.
    Activated { remaining_secs: i64 },
    /// The device used up its trial.
    Expired,
}

impl PermitStatus {
    fn from_remaining(remaining: i64) -> Self {
        if remaining > 0 {
            Self::Activated {
                remaining_secs: remaining,
            }
        } else {
            Self::Expired
        }
    }

    /// Wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activated { .. } => "activated",
            Self::Expired => "expired",
        }
    }

    /// Seconds left; zero once expired.
    #[must_use]
    pub fn remaining_secs(&self) -> i64 {
        match self {
            Self::Activated { remaining_secs } => *remaining_secs,
            Self::Expired => 0,
        }
    }
}

/// Orchestrates key resolution, binding, permits and signing.
///
/// Holds no per-request state; share it behind an `Arc`.
pub struct IssuanceService {
    serials: Arc<dyn SerialNumberLedger>,
    permits: Arc<dyn TemporaryPermitLedger>,
    cache: Option<Arc<dyn DeviceKeyCache>>,
    signer: Arc<Signer>,
    config: IssuanceConfig,
}

impl IssuanceService {
    pub fn new(
        serials: Arc<dyn SerialNumberLedger>,
        permits: Arc<dyn TemporaryPermitLedger>,
        signer: Signer,
        config: IssuanceConfig,
    ) -> Self {
        Self {
            serials,
            permits,
            cache: None,
            signer: Arc::new(signer),
            config,
        }
    }

    /// Adds a device key cache in front of derivation.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn DeviceKeyCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    #[must_use]
    pub fn config(&self) -> &IssuanceConfig {
        &self.config
    }

    #[must_use]
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Binds the device to `serial` and returns its signed key.
    ///
    /// Repeating the call from the same device succeeds with the same key;
    /// a second device gets `NotFoundOrAlreadyBound`.
    pub async fn apply_certificate(&self, serial: &SerialNumber, hardware: &HardwareInfo) -> IssuanceResult<Certificate> {
        if !self.storage(self.serials.exists(serial)).await? {
            return Err(IssuanceError::SerialNumberNotFound(serial.to_string()));
        }

        let fingerprint = DeviceFingerprint::for_serial(serial, hardware);
        let key = self.resolve_device_key(&fingerprint).await?;

        self.storage(self.serials.bind(serial, &key)).await?;

        let signature = self.signer.sign(key.as_bytes())?.to_base64();
        Ok(Certificate { key, signature })
    }

    /// Starts or reports the trial permit of the device.
    pub async fn apply_temporary_permit(&self, hardware: &HardwareInfo) -> IssuanceResult<PermitStatus> {
        let fingerprint = DeviceFingerprint::for_trial(hardware);
        let key = self.resolve_device_key(&fingerprint).await?;

        match self.storage(self.permits.get_remaining(&key)).await? {
            PermitLookup::Remaining(remaining) => Ok(PermitStatus::from_remaining(remaining)),
            PermitLookup::AllowNewPermit => match self.storage(self.permits.create(&key)).await {
                Ok(granted) => Ok(PermitStatus::from_remaining(granted)),
                // Lost a creation race: report the winner's permit.
                Err(LedgerError::PermitExists) => match self.storage(self.permits.get_remaining(&key)).await? {
                    PermitLookup::Remaining(remaining) => Ok(PermitStatus::from_remaining(remaining)),
                    PermitLookup::AllowNewPermit => Err(IssuanceError::Storage(LedgerError::InvalidData(
                        "permit reported as existing but not found".to_string(),
                    ))),
                },
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Cache lookup with derivation fallback and write-through.
    ///
    /// A miss (or no cache at all) derives the key. An unreachable cache is
    /// an error, never a silent miss.
    pub async fn resolve_device_key(&self, fingerprint: &DeviceFingerprint) -> IssuanceResult<DeviceKey> {
        let Some(cache) = &self.cache else {
            return Ok(derive_device_key(fingerprint));
        };

        if let Some(key) = self.cached(cache.get(fingerprint)).await? {
            return Ok(key);
        }

        let key = derive_device_key(fingerprint);
        self.cached(cache.set(fingerprint, &key, self.config.cache_ttl)).await?;
        Ok(key)
    }

    async fn storage<T>(&self, call: impl Future<Output = LedgerResult<T>>) -> LedgerResult<T> {
        tokio::time::timeout(self.config.dependency_timeout, call)
            .await
            .map_err(|_| LedgerError::Timeout)?
    }

    async fn cached<T>(&self, call: impl Future<Output = Result<T, CacheError>>) -> IssuanceResult<T> {
        match tokio::time::timeout(self.config.dependency_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(IssuanceError::cache(e)),
            Err(_) => Err(IssuanceError::cache(CacheError::Timeout)),
        }
    }
}

impl std::fmt::Debug for IssuanceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuanceService")
            .field("cache", &self.cache.is_some())
            .field("signer", &self.signer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
