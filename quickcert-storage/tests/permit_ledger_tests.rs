use chrono::{TimeZone, Utc};
use quickcert_storage::{LedgerError, PermitLookup, SqliteLedger, TemporaryPermitLedger};
use quickcert_types::{DeviceKey, ManualClock, PermitDuration, PermitTimeUnit};
use std::sync::Arc;

fn key(byte: u8) -> DeviceKey {
    DeviceKey::from_digest(&[byte; 32])
}

fn ledger_with(duration: PermitDuration) -> (SqliteLedger, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()));
    let ledger = SqliteLedger::open_in_memory()
        .unwrap()
        .with_permit_duration(duration)
        .with_clock(clock.clone());
    (ledger, clock)
}

// ── Lifecycle ────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_key_allows_new_permit() {
    let (ledger, _) = ledger_with(PermitDuration::default());
    assert_eq!(ledger.get_remaining(&key(1)).await.unwrap(), PermitLookup::AllowNewPermit);
    assert!(ledger.find(&key(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn create_grants_configured_duration() {
    let (ledger, _) = ledger_with(PermitDuration::new(2, PermitTimeUnit::Hour).unwrap());
    assert_eq!(ledger.create(&key(1)).await.unwrap(), 7_200);
    assert_eq!(ledger.get_remaining(&key(1)).await.unwrap(), PermitLookup::Remaining(7_200));
}

#[tokio::test]
async fn remaining_counts_down_and_expires() {
    let (ledger, clock) = ledger_with(PermitDuration::new(1, PermitTimeUnit::Minute).unwrap());
    ledger.create(&key(1)).await.unwrap();

    clock.advance_secs(45);
    assert_eq!(ledger.get_remaining(&key(1)).await.unwrap(), PermitLookup::Remaining(15));

    clock.advance_secs(15);
    assert_eq!(ledger.get_remaining(&key(1)).await.unwrap(), PermitLookup::Remaining(0));

    clock.advance_secs(100);
    assert_eq!(ledger.get_remaining(&key(1)).await.unwrap(), PermitLookup::Remaining(-100));
}

#[tokio::test]
async fn expired_permit_still_blocks_new_permit() {
    let (ledger, clock) = ledger_with(PermitDuration::new(1, PermitTimeUnit::Second).unwrap());
    ledger.create(&key(1)).await.unwrap();
    clock.advance_secs(3_600);

    assert!(matches!(
        ledger.get_remaining(&key(1)).await.unwrap(),
        PermitLookup::Remaining(r) if r < 0
    ));
    assert!(matches!(ledger.create(&key(1)).await, Err(LedgerError::PermitExists)));
}

#[tokio::test]
async fn second_create_does_not_extend_expiry() {
    let (ledger, clock) = ledger_with(PermitDuration::new(10, PermitTimeUnit::Second).unwrap());
    ledger.create(&key(1)).await.unwrap();
    let original = ledger.find(&key(1)).await.unwrap().unwrap();

    clock.advance_secs(5);
    assert!(matches!(ledger.create(&key(1)).await, Err(LedgerError::PermitExists)));
    assert_eq!(ledger.find(&key(1)).await.unwrap().unwrap(), original);
}

#[tokio::test]
async fn permits_are_per_key() {
    let (ledger, _) = ledger_with(PermitDuration::default());
    ledger.create(&key(1)).await.unwrap();
    assert_eq!(ledger.get_remaining(&key(2)).await.unwrap(), PermitLookup::AllowNewPermit);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_store_one_permit() {
    let (ledger, _) = ledger_with(PermitDuration::default());
    let ledger = Arc::new(ledger);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.create(&key(5)).await })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(LedgerError::PermitExists) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn disconnected_permit_ledger_reports_not_connected() {
    let (ledger, _) = ledger_with(PermitDuration::default());
    ledger.disconnect().unwrap();
    assert!(matches!(ledger.get_remaining(&key(1)).await, Err(LedgerError::NotConnected)));
    assert!(matches!(ledger.create(&key(1)).await, Err(LedgerError::NotConnected)));
}
