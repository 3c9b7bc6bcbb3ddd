//! Device key cache.
//!
//! Purely an optimisation: a miss is answered by deriving the key again,
//! which is safe only because derivation is deterministic. An unreachable
//! cache is a different thing from a miss and is reported as an error.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use quickcert_types::{Clock, DeviceFingerprint, DeviceKey, SystemClock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// How long a cached key lives after it is written.
pub const DEFAULT_CACHE_TTL: Duration = Duration::days(7);

/// Entries held before new writes are dropped.
pub const DEFAULT_CACHE_CAPACITY: usize = 1_000_000;

/// Minimum time between two sweeps of expired entries.
const SWEEP_INTERVAL: Duration = Duration::minutes(10);

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors from the cache collaborator. A miss is not one of them.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("currently not connected to the cache")]
    NotConnected,

    #[error("cache call timed out")]
    Timeout,

    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Fingerprint → device key store with per-entry TTL.
#[async_trait]
pub trait DeviceKeyCache: Send + Sync {
    /// `Ok(None)` on a miss or an expired entry.
    async fn get(&self, fingerprint: &DeviceFingerprint) -> CacheResult<Option<DeviceKey>>;

    async fn set(&self, fingerprint: &DeviceFingerprint, key: &DeviceKey, ttl: Duration) -> CacheResult<()>;
}

#[derive(Debug, Clone)]
struct Entry {
    key: DeviceKey,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<DeviceFingerprint, Entry>,
    next_sweep: Option<DateTime<Utc>>,
}

impl Entries {
    /// Drops expired entries, at most once per [`SWEEP_INTERVAL`].
    fn sweep(&mut self, now: DateTime<Utc>) {
        if self.next_sweep.is_some_and(|at| now < at) {
            return;
        }
        self.map.retain(|_, entry| entry.expires_at > now);
        self.next_sweep = Some(now + SWEEP_INTERVAL);
    }
}

/// In-process cache.
///
/// Expired entries are dropped on read and swept on write. Once
/// `capacity` live entries are held, writes for new fingerprints are
/// skipped; those keys are simply derived again on the next request.
#[derive(Debug)]
pub struct MemoryKeyCache {
    entries: Mutex<Entries>,
    capacity: usize,
    connected: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl MemoryKeyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: DEFAULT_CACHE_CAPACITY,
            connected: AtomicBool::new(true),
            clock,
        }
    }

    /// Caps the number of stored entries.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Drops every entry and refuses further calls with `NotConnected`.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        if let Ok(mut entries) = self.entries.lock() {
            entries.map.clear();
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.map.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_connected(&self) -> CacheResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(CacheError::NotConnected)
        }
    }

    fn lock(&self) -> CacheResult<std::sync::MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Backend(format!("cache lock poisoned: {e}")))
    }
}

impl Default for MemoryKeyCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceKeyCache for MemoryKeyCache {
    async fn get(&self, fingerprint: &DeviceFingerprint) -> CacheResult<Option<DeviceKey>> {
        self.check_connected()?;
        let now = self.clock.now();
        let mut entries = self.lock()?;
        match entries.map.get(fingerprint) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.key.clone())),
            Some(_) => {
                entries.map.remove(fingerprint);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, fingerprint: &DeviceFingerprint, key: &DeviceKey, ttl: Duration) -> CacheResult<()> {
        self.check_connected()?;
        let now = self.clock.now();
        let mut entries = self.lock()?;
        entries.sweep(now);
        if entries.map.len() >= self.capacity && !entries.map.contains_key(fingerprint) {
            return Ok(());
        }
        entries.map.insert(
            fingerprint.clone(),
            Entry {
                key: key.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }
}
