//! Wiring the services together from a validated [`Config`].

use crate::auth::{generate_runtime_code, AccessPolicy};
use crate::config::Config;
use crate::state::AppState;
use anyhow::{bail, Context, Result};
use quickcert_crypto::{KeyMaterial, SignatureVerifier, Signer, DEFAULT_KEY_BITS};
use quickcert_issuance::{Inventory, IssuanceConfig, IssuanceService, MemoryKeyCache};
use quickcert_storage::SqliteLedger;
use std::sync::Arc;
use tracing::info;

const KEY_PAIR_PROBE: &[u8] = b"quickcert key pair check";

/// Loads keys, opens the ledger and assembles the handler state.
///
/// Fails if the private and public key files do not belong together,
/// since every certificate signed with a mismatched pair is unverifiable.
pub fn build_state(config: &Config) -> Result<AppState> {
    let signing = &config.signing;
    let material = KeyMaterial::load(&signing.private_key_path)
        .with_context(|| format!("failed to load private key {}", signing.private_key_path.display()))?;
    let signer = Signer::new(&material, signing.hashing_method, signing.pss_salt_length);
    let verifier = SignatureVerifier::load(&signing.public_key_path, signing.hashing_method, signing.pss_salt_length)
        .with_context(|| format!("failed to load public key {}", signing.public_key_path.display()))?;

    let probe = signer.sign(KEY_PAIR_PROBE).context("failed to sign key pair probe")?;
    verifier
        .verify(KEY_PAIR_PROBE, &probe)
        .context("public key does not match private key")?;
    info!(
        hash = signing.hashing_method.name(),
        salt_len = signer.salt_len(),
        bits = material.modulus_bits(),
        "Loaded signing key"
    );

    let db_path = &config.database.path;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database directory {}", parent.display()))?;
    }
    let permit_duration = config.permit_duration()?;
    let ledger = Arc::new(
        SqliteLedger::open(db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?
            .with_permit_duration(permit_duration),
    );
    info!(%permit_duration, "Temporary permit duration");

    let issuance_config = IssuanceConfig {
        cache_ttl: config.cache_ttl(),
        dependency_timeout: config.dependency_timeout(),
    };
    let mut issuance = IssuanceService::new(ledger.clone(), ledger.clone(), signer, issuance_config);
    if config.cache.enabled {
        issuance = issuance.with_cache(Arc::new(MemoryKeyCache::new()));
        info!(ttl_secs = config.cache.ttl_secs, "Device key cache enabled");
    } else {
        info!("Device key cache disabled");
    }

    let runtime_code = config
        .security
        .use_runtime_code
        .then(|| generate_runtime_code(config.security.runtime_code_length));
    if let Some(code) = &runtime_code {
        info!(runtime_code = %code, "Admin runtime code generated");
    }
    let policy = AccessPolicy::new(&config.security, runtime_code);

    let inventory = Inventory::new(ledger, config.dependency_timeout());
    Ok(AppState::new(issuance, inventory, policy))
}

/// Generates a fresh signing key pair at the configured paths.
///
/// Refuses to touch either file if one already exists: replacing the key
/// invalidates every certificate issued so far.
pub fn init_keys(config: &Config) -> Result<()> {
    let private = &config.signing.private_key_path;
    let public = &config.signing.public_key_path;
    for path in [private, public] {
        if path.exists() {
            bail!("{} already exists; refusing to overwrite", path.display());
        }
    }

    info!(bits = DEFAULT_KEY_BITS, "Generating RSA key pair");
    let material = KeyMaterial::generate(DEFAULT_KEY_BITS).context("failed to generate key pair")?;
    material
        .write_pem_files(private, public)
        .context("failed to write key files")?;
    info!(private = %private.display(), public = %public.display(), "Wrote key pair");
    Ok(())
}
