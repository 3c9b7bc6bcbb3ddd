//! Administrative view of the serial number inventory.

use crate::error::{IssuanceError, IssuanceResult};
use quickcert_storage::{LedgerError, LedgerResult, SerialNumberLedger};
use quickcert_types::{CertificateRecord, SerialNumber};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on serial numbers generated in one call.
pub const MAX_GENERATE_COUNT: usize = 10_000;

/// Provisioning and reporting over a [`SerialNumberLedger`].
#[derive(Clone)]
pub struct Inventory {
    ledger: Arc<dyn SerialNumberLedger>,
    timeout: Duration,
}

impl Inventory {
    pub fn new(ledger: Arc<dyn SerialNumberLedger>, timeout: Duration) -> Self {
        Self { ledger, timeout }
    }

    /// Provisions one caller-chosen serial number.
    pub async fn create(&self, serial: &SerialNumber) -> IssuanceResult<()> {
        Ok(self.bounded(self.ledger.provision(serial)).await?)
    }

    /// Generates and provisions `count` fresh serial numbers.
    pub async fn generate(&self, count: usize) -> IssuanceResult<Vec<SerialNumber>> {
        if count == 0 {
            return Err(IssuanceError::Validation("count must be greater than zero".to_string()));
        }
        if count > MAX_GENERATE_COUNT {
            return Err(IssuanceError::Validation(format!(
                "count must not exceed {MAX_GENERATE_COUNT}"
            )));
        }
        let serials: Vec<SerialNumber> = (0..count).map(|_| SerialNumber::generate()).collect();
        self.bounded(self.ledger.provision_many(&serials)).await?;
        Ok(serials)
    }

    pub async fn update_note(&self, serial: &SerialNumber, note: &str) -> IssuanceResult<()> {
        Ok(self.bounded(self.ledger.update_note(serial, note)).await?)
    }

    pub async fn list_all(&self) -> IssuanceResult<Vec<CertificateRecord>> {
        Ok(self.bounded(self.ledger.list_all()).await?)
    }

    pub async fn list_unbound(&self) -> IssuanceResult<Vec<SerialNumber>> {
        Ok(self.bounded(self.ledger.list_unbound()).await?)
    }

    async fn bounded<T>(&self, call: impl Future<Output = LedgerResult<T>>) -> LedgerResult<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| LedgerError::Timeout)?
    }
}

impl std::fmt::Debug for Inventory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inventory")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
