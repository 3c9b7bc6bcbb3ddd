//! Shared test helpers for issuance tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use quickcert_crypto::{HashAlgorithm, KeyMaterial, SaltLength, SignatureVerifier, Signer};
use quickcert_issuance::{CacheResult, DeviceKeyCache, IssuanceConfig, IssuanceService};
use quickcert_storage::SqliteLedger;
use quickcert_types::{DeviceFingerprint, DeviceKey, HardwareInfo, ManualClock, PermitDuration};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../../../testdata/rsa_private_key.pem");
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../../../testdata/rsa_public_key.pem");

pub fn signer() -> Signer {
    let material = KeyMaterial::from_pkcs8_pem(TEST_PRIVATE_KEY_PEM).unwrap();
    Signer::new(&material, HashAlgorithm::Sha256, SaltLength::HashLength)
}

pub fn verifier() -> SignatureVerifier {
    SignatureVerifier::from_public_key_pem(TEST_PUBLIC_KEY_PEM, HashAlgorithm::Sha256, SaltLength::HashLength)
        .unwrap()
}

pub fn acme() -> HardwareInfo {
    HardwareInfo::new("Acme", "X1", "AA:BB")
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()))
}

pub fn ledger(duration: PermitDuration, clock: Arc<ManualClock>) -> Arc<SqliteLedger> {
    Arc::new(
        SqliteLedger::open_in_memory()
            .unwrap()
            .with_permit_duration(duration)
            .with_clock(clock),
    )
}

/// Service over a fresh in-memory ledger, without a cache.
pub fn service(ledger: &Arc<SqliteLedger>) -> IssuanceService {
    IssuanceService::new(ledger.clone(), ledger.clone(), signer(), IssuanceConfig::default())
}

/// A cache that never answers in time.
pub struct StalledCache;

#[async_trait]
impl DeviceKeyCache for StalledCache {
    async fn get(&self, _: &DeviceFingerprint) -> CacheResult<Option<DeviceKey>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(None)
    }

    async fn set(&self, _: &DeviceFingerprint, _: &DeviceKey, _: chrono::Duration) -> CacheResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// A cache that hands back a fixed key for every fingerprint.
pub struct PoisonedCache(pub DeviceKey);

#[async_trait]
impl DeviceKeyCache for PoisonedCache {
    async fn get(&self, _: &DeviceFingerprint) -> CacheResult<Option<DeviceKey>> {
        Ok(Some(self.0.clone()))
    }

    async fn set(&self, _: &DeviceFingerprint, _: &DeviceKey, _: chrono::Duration) -> CacheResult<()> {
        Ok(())
    }
}
