//! Shared handler state.

use crate::auth::AccessPolicy;
use quickcert_issuance::{Inventory, IssuanceService};
use std::sync::Arc;

/// Everything a handler or middleware needs. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub issuance: Arc<IssuanceService>,
    pub inventory: Inventory,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(issuance: IssuanceService, inventory: Inventory, policy: AccessPolicy) -> Self {
        Self {
            issuance: Arc::new(issuance),
            inventory,
            policy: Arc::new(policy),
        }
    }
}
