//! Shared helpers for HTTP tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use quickcert_crypto::{HashAlgorithm, KeyMaterial, SaltLength, SignatureVerifier, Signer};
use quickcert_issuance::{Inventory, IssuanceConfig, IssuanceService, MemoryKeyCache};
use quickcert_server::auth::AccessPolicy;
use quickcert_server::config::{AdminToken, SecuritySection};
use quickcert_server::{serve, AppState};
use quickcert_storage::SqliteLedger;
use quickcert_types::{ManualClock, PermitDuration};
use std::sync::Arc;
use std::time::Duration;

pub const TEST_PRIVATE_KEY_PEM: &str = include_str!("../../../testdata/rsa_private_key.pem");
pub const TEST_PUBLIC_KEY_PEM: &str = include_str!("../../../testdata/rsa_public_key.pem");

pub const CLIENT_TOKEN: &str = "client-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const RUNTIME_CODE: &str = "Rt5Code9";

pub struct TestServer {
    pub base: String,
    pub ledger: Arc<SqliteLedger>,
    pub clock: Arc<ManualClock>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

pub fn security() -> SecuritySection {
    SecuritySection {
        allowed_ips: vec!["127.0.0.1".to_string()],
        client_auth_tokens: vec![CLIENT_TOKEN.to_string()],
        admin_tokens: vec![AdminToken {
            name: "tester".to_string(),
            token: ADMIN_TOKEN.to_string(),
        }],
        use_runtime_code: true,
        runtime_code_length: RUNTIME_CODE.len(),
    }
}

pub fn verifier() -> SignatureVerifier {
    SignatureVerifier::from_public_key_pem(TEST_PUBLIC_KEY_PEM, HashAlgorithm::Sha256, SaltLength::HashLength)
        .unwrap()
}

/// Spin up the HTTP server on an OS-assigned port.
pub async fn spawn_with(security: SecuritySection, permit: PermitDuration) -> TestServer {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()));
    let ledger = Arc::new(
        SqliteLedger::open_in_memory()
            .unwrap()
            .with_permit_duration(permit)
            .with_clock(clock.clone()),
    );

    let material = KeyMaterial::from_pkcs8_pem(TEST_PRIVATE_KEY_PEM).unwrap();
    let signer = Signer::new(&material, HashAlgorithm::Sha256, SaltLength::HashLength);
    let issuance = IssuanceService::new(ledger.clone(), ledger.clone(), signer, IssuanceConfig::default())
        .with_cache(Arc::new(MemoryKeyCache::new()));
    let inventory = Inventory::new(ledger.clone(), Duration::from_secs(5));
    let runtime_code = security.use_runtime_code.then(|| RUNTIME_CODE.to_string());
    let policy = AccessPolicy::new(&security, runtime_code);
    let state = AppState::new(issuance, inventory, policy);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        serve(listener, state, std::future::pending()).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        ledger,
        clock,
    }
}

pub async fn spawn_test_server() -> TestServer {
    spawn_with(security(), PermitDuration::default()).await
}

pub fn admin_post(client: &reqwest::Client, server: &TestServer, path: &str) -> reqwest::RequestBuilder {
    client
        .post(server.url(path))
        .header("X-Access-Token", ADMIN_TOKEN)
        .header("X-Runtime-Code", RUNTIME_CODE)
}

pub fn admin_get(client: &reqwest::Client, server: &TestServer, path: &str) -> reqwest::RequestBuilder {
    client
        .get(server.url(path))
        .header("X-Access-Token", ADMIN_TOKEN)
        .header("X-Runtime-Code", RUNTIME_CODE)
}

pub fn client_post(client: &reqwest::Client, server: &TestServer, path: &str) -> reqwest::RequestBuilder {
    client.post(server.url(path)).header("X-Access-Token", CLIENT_TOKEN)
}
