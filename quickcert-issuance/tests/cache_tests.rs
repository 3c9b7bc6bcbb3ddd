mod common;

use common::{acme, clock, ledger, service, verifier, PoisonedCache, StalledCache};
use quickcert_crypto::derive_device_key;
use quickcert_issuance::{
    CacheError, Dependency, DeviceKeyCache, ErrorKind, IssuanceConfig, IssuanceError, MemoryKeyCache,
    DEFAULT_CACHE_TTL,
};
use quickcert_storage::SerialNumberLedger;
use quickcert_types::{DeviceFingerprint, DeviceKey, PermitDuration, SerialNumber};
use std::sync::Arc;
use std::time::Duration;

fn fingerprint() -> DeviceFingerprint {
    DeviceFingerprint::for_trial(&acme())
}

// ── MemoryKeyCache ───────────────────────────────────────────────

#[tokio::test]
async fn miss_then_hit() {
    let cache = MemoryKeyCache::new();
    let key = derive_device_key(&fingerprint());

    assert!(cache.get(&fingerprint()).await.unwrap().is_none());
    cache.set(&fingerprint(), &key, DEFAULT_CACHE_TTL).await.unwrap();
    assert_eq!(cache.get(&fingerprint()).await.unwrap(), Some(key));
}

#[tokio::test]
async fn entries_expire_after_ttl() {
    let clock = clock();
    let cache = MemoryKeyCache::with_clock(clock.clone());
    let key = derive_device_key(&fingerprint());
    cache.set(&fingerprint(), &key, chrono::Duration::seconds(60)).await.unwrap();

    clock.advance_secs(59);
    assert!(cache.get(&fingerprint()).await.unwrap().is_some());

    clock.advance_secs(1);
    assert!(cache.get(&fingerprint()).await.unwrap().is_none());
    assert!(cache.is_empty());
}

fn nth_fingerprint(n: usize) -> DeviceFingerprint {
    DeviceFingerprint::for_trial(&quickcert_types::HardwareInfo::new("Acme", "X1", format!("MAC-{n}")))
}

#[tokio::test]
async fn writes_sweep_expired_entries() {
    let clock = clock();
    let cache = MemoryKeyCache::with_clock(clock.clone());
    let key = DeviceKey::from_digest(&[1; 32]);
    for n in 0..1000 {
        cache.set(&nth_fingerprint(n), &key, DEFAULT_CACHE_TTL).await.unwrap();
    }
    assert_eq!(cache.len(), 1000);

    clock.advance(chrono::Duration::days(30));
    for n in 1000..1010 {
        cache.set(&nth_fingerprint(n), &key, DEFAULT_CACHE_TTL).await.unwrap();
    }

    assert_eq!(cache.len(), 10);
}

#[tokio::test]
async fn live_entries_survive_a_sweep() {
    let clock = clock();
    let cache = MemoryKeyCache::with_clock(clock.clone());
    let key = DeviceKey::from_digest(&[1; 32]);
    cache.set(&nth_fingerprint(0), &key, chrono::Duration::days(60)).await.unwrap();
    cache.set(&nth_fingerprint(1), &key, DEFAULT_CACHE_TTL).await.unwrap();

    clock.advance(chrono::Duration::days(30));
    cache.set(&nth_fingerprint(2), &key, DEFAULT_CACHE_TTL).await.unwrap();

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get(&nth_fingerprint(0)).await.unwrap(), Some(key));
}

#[tokio::test]
async fn full_cache_skips_new_fingerprints() {
    let clock = clock();
    let cache = MemoryKeyCache::with_clock(clock.clone()).with_capacity(3);
    let key = DeviceKey::from_digest(&[1; 32]);
    for n in 0..5 {
        cache.set(&nth_fingerprint(n), &key, DEFAULT_CACHE_TTL).await.unwrap();
    }

    assert_eq!(cache.len(), 3);
    assert!(cache.get(&nth_fingerprint(4)).await.unwrap().is_none());
    // Refreshing a stored fingerprint is still allowed.
    cache.set(&nth_fingerprint(0), &key, DEFAULT_CACHE_TTL).await.unwrap();
    assert_eq!(cache.len(), 3);

    clock.advance(chrono::Duration::days(8));
    cache.set(&nth_fingerprint(4), &key, DEFAULT_CACHE_TTL).await.unwrap();
    assert_eq!(cache.get(&nth_fingerprint(4)).await.unwrap(), Some(key));
}

#[tokio::test]
async fn disconnected_cache_refuses_calls() {
    let cache = MemoryKeyCache::new();
    cache.disconnect();

    assert!(!cache.is_connected());
    assert!(matches!(cache.get(&fingerprint()).await, Err(CacheError::NotConnected)));
}

// ── Service integration ──────────────────────────────────────────

#[tokio::test]
async fn miss_derives_and_writes_through() {
    let ledger = ledger(PermitDuration::default(), clock());
    let cache = Arc::new(MemoryKeyCache::new());
    let service = service(&ledger).with_cache(cache.clone());

    let key = service.resolve_device_key(&fingerprint()).await.unwrap();

    assert_eq!(key, derive_device_key(&fingerprint()));
    assert_eq!(cache.get(&fingerprint()).await.unwrap(), Some(key));
}

#[tokio::test]
async fn cached_and_uncached_keys_agree() {
    let ledger = ledger(PermitDuration::default(), clock());
    let uncached = service(&ledger);
    let cached = service(&ledger).with_cache(Arc::new(MemoryKeyCache::new()));

    let a = uncached.resolve_device_key(&fingerprint()).await.unwrap();
    let b = cached.resolve_device_key(&fingerprint()).await.unwrap();
    let c = cached.resolve_device_key(&fingerprint()).await.unwrap();

    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[tokio::test]
async fn hit_is_used_without_derivation() {
    let ledger = ledger(PermitDuration::default(), clock());
    let planted = DeviceKey::from_digest(&[7; 32]);
    let service = service(&ledger).with_cache(Arc::new(PoisonedCache(planted.clone())));

    assert_eq!(service.resolve_device_key(&fingerprint()).await.unwrap(), planted);
}

#[tokio::test]
async fn unreachable_cache_is_not_a_miss() {
    let ledger = ledger(PermitDuration::default(), clock());
    let serial = SerialNumber::new("SN1").unwrap();
    ledger.provision(&serial).await.unwrap();
    let cache = Arc::new(MemoryKeyCache::new());
    cache.disconnect();
    let service = service(&ledger).with_cache(cache);

    let err = service.apply_certificate(&serial, &acme()).await.unwrap_err();

    assert!(matches!(
        err,
        IssuanceError::Connectivity {
            dependency: Dependency::Cache,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Connectivity);
    // Nothing was bound.
    assert!(ledger.list_all().await.unwrap()[0].key.is_none());
}

#[tokio::test(start_paused = true)]
async fn slow_cache_times_out() {
    let ledger = ledger(PermitDuration::default(), clock());
    let config = IssuanceConfig {
        dependency_timeout: Duration::from_millis(200),
        ..IssuanceConfig::default()
    };
    let service = quickcert_issuance::IssuanceService::new(ledger.clone(), ledger.clone(), common::signer(), config)
        .with_cache(Arc::new(StalledCache));

    let err = service.apply_temporary_permit(&acme()).await.unwrap_err();

    assert!(matches!(
        err,
        IssuanceError::Connectivity {
            dependency: Dependency::Cache,
            ..
        }
    ));
}

#[tokio::test]
async fn certificate_signature_verifies_through_cache() {
    let ledger = ledger(PermitDuration::default(), clock());
    let serial = SerialNumber::new("SN1").unwrap();
    ledger.provision(&serial).await.unwrap();
    let service = service(&ledger).with_cache(Arc::new(MemoryKeyCache::new()));

    let first = service.apply_certificate(&serial, &acme()).await.unwrap();
    let second = service.apply_certificate(&serial, &acme()).await.unwrap();

    assert_eq!(first.key, second.key);
    verifier().verify_base64(second.key.as_bytes(), &second.signature).unwrap();
}
