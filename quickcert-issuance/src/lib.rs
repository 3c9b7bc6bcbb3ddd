//! Issuance service for QuickCert.
//!
//! [`IssuanceService`] answers the two client operations:
//! - `apply_certificate`: bind a device to a serial number and return its
//!   signed device key
//! - `apply_temporary_permit`: start or report a device's trial period
//!
//! [`Inventory`] covers the administrative side (provisioning, notes,
//! listings). Every cache and storage call is bounded by a timeout, and a
//! timeout is reported as a connectivity failure.

mod cache;
mod error;
mod inventory;
mod service;

pub use cache::{CacheError, CacheResult, DeviceKeyCache, MemoryKeyCache, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
pub use error::{Dependency, ErrorKind, IssuanceError, IssuanceResult};
pub use inventory::{Inventory, MAX_GENERATE_COUNT};
pub use service::{Certificate, IssuanceConfig, IssuanceService, PermitStatus, DEFAULT_DEPENDENCY_TIMEOUT};
