//! Ledger traits consumed by the issuance service.

use crate::error::LedgerResult;
use async_trait::async_trait;
use quickcert_types::{CertificateRecord, DeviceKey, SerialNumber, TemporaryPermit};

/// Answer to "how much trial time does this device have left?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermitLookup {
    /// No permit has ever been created for the key; the caller may create one.
    AllowNewPermit,
    /// Seconds until expiry. Zero or negative means expired.
    Remaining(i64),
}

/// Durable store of serial numbers and their device bindings.
#[async_trait]
pub trait SerialNumberLedger: Send + Sync {
    /// Inserts an unbound record.
    ///
    /// Fails with `AlreadyExists` if the serial number is present.
    async fn provision(&self, serial: &SerialNumber) -> LedgerResult<()>;

    /// Inserts many unbound records, all or nothing.
    ///
    /// Fails with `SomeAlreadyExist` if any serial number collides, either
    /// with a stored one or with another entry in `serials`.
    async fn provision_many(&self, serials: &[SerialNumber]) -> LedgerResult<()>;

    /// Binds `key` to `serial` as one conditional update.
    ///
    /// Succeeds if the serial number exists and is unbound or already bound
    /// to `key`; fails with `NotFoundOrAlreadyBound` otherwise.
    async fn bind(&self, serial: &SerialNumber, key: &DeviceKey) -> LedgerResult<()>;

    async fn exists(&self, serial: &SerialNumber) -> LedgerResult<bool>;

    /// Replaces the note. Fails with `NotFound` if the serial number is absent.
    async fn update_note(&self, serial: &SerialNumber, note: &str) -> LedgerResult<()>;

    /// Every record in provisioning order.
    async fn list_all(&self) -> LedgerResult<Vec<CertificateRecord>>;

    /// Serial numbers with no device bound yet.
    async fn list_unbound(&self) -> LedgerResult<Vec<SerialNumber>>;
}

/// Durable store of trial permits keyed by device key.
#[async_trait]
pub trait TemporaryPermitLedger: Send + Sync {
    /// Remaining seconds for `key`, computed against the ledger's clock.
    async fn get_remaining(&self, key: &DeviceKey) -> LedgerResult<PermitLookup>;

    /// Creates the permit for `key` and returns the seconds granted.
    ///
    /// Insert-if-absent: fails with `PermitExists` when a permit is already
    /// stored, in which case the caller should read it back.
    async fn create(&self, key: &DeviceKey) -> LedgerResult<i64>;

    /// The stored permit, if any.
    async fn find(&self, key: &DeviceKey) -> LedgerResult<Option<TemporaryPermit>>;
}
