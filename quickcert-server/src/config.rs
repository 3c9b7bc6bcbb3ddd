//! Server configuration loaded from TOML.
//!
//! Every field has a default, so a minimal file only needs the values that
//! differ. [`Config::load`] parses and validates in one step; a config that
//! loads is safe to start from.

use quickcert_crypto::{HashAlgorithm, SaltLength};
use quickcert_issuance::DEFAULT_CACHE_TTL;
use quickcert_types::{PermitDuration, PermitTimeUnit};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "configs/server.toml";

/// Shortest runtime code accepted when runtime codes are enabled.
pub const MIN_RUNTIME_CODE_LENGTH: usize = 6;

/// Longest trial permit or cache TTL accepted (100 years).
pub const MAX_DURATION_SECS: u64 = 100 * 365 * 86_400;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerSection,
    pub security: SecuritySection,
    pub signing: SigningSection,
    pub temporary_permit: TemporaryPermitSection,
    pub database: DatabaseSection,
    pub cache: CacheSection,
    pub timeouts: TimeoutSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 33333,
        }
    }
}

/// Named admin credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminToken {
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecuritySection {
    /// Addresses allowed to reach the admin routes; `*` allows any.
    pub allowed_ips: Vec<String>,
    /// Accepted client tokens. An empty string entry accepts any non-empty token.
    pub client_auth_tokens: Vec<String>,
    pub admin_tokens: Vec<AdminToken>,
    pub use_runtime_code: bool,
    pub runtime_code_length: usize,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            allowed_ips: vec!["127.0.0.1".to_string()],
            client_auth_tokens: vec![String::new()],
            admin_tokens: Vec::new(),
            use_runtime_code: true,
            runtime_code_length: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SigningSection {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub hashing_method: HashAlgorithm,
    pub pss_salt_length: SaltLength,
}

impl Default for SigningSection {
    fn default() -> Self {
        Self {
            private_key_path: PathBuf::from("keys/private.pem"),
            public_key_path: PathBuf::from("keys/public.pem"),
            hashing_method: HashAlgorithm::default(),
            pss_salt_length: SaltLength::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemporaryPermitSection {
    pub time: u32,
    pub time_unit: PermitTimeUnit,
}

impl Default for TemporaryPermitSection {
    fn default() -> Self {
        let duration = PermitDuration::default();
        Self {
            time: duration.amount(),
            time_unit: duration.unit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub path: PathBuf,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/quickcert.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL.num_seconds().unsigned_abs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSection {
    pub dependency_timeout_ms: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            dependency_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Reads, parses and validates the file at `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        raw.parse()
    }

    /// Rejects values that parse but cannot be served.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".to_string()));
        }

        for entry in &self.security.allowed_ips {
            if entry != "*" && entry.parse::<IpAddr>().is_err() {
                return Err(ConfigError::Invalid(format!(
                    "security.allowed_ips: {entry:?} is neither an IP address nor \"*\""
                )));
            }
        }

        if let Some(admin) = self.security.admin_tokens.iter().find(|a| a.token.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "security.admin_tokens: token for {:?} must not be empty",
                admin.name
            )));
        }

        if self.security.use_runtime_code && self.security.runtime_code_length < MIN_RUNTIME_CODE_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "security.runtime_code_length must be at least {MIN_RUNTIME_CODE_LENGTH}"
            )));
        }

        let permit = self.permit_duration()?;
        if permit.as_secs().unsigned_abs() > MAX_DURATION_SECS {
            return Err(ConfigError::Invalid(format!(
                "temporary_permit: {permit} exceeds {MAX_DURATION_SECS} seconds"
            )));
        }

        if self.cache.ttl_secs == 0 || self.cache.ttl_secs > MAX_DURATION_SECS {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_secs must be between 1 and {MAX_DURATION_SECS}"
            )));
        }
        if self.timeouts.dependency_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "timeouts.dependency_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Length of a newly created trial permit.
    pub fn permit_duration(&self) -> ConfigResult<PermitDuration> {
        PermitDuration::new(self.temporary_permit.time, self.temporary_permit.time_unit)
            .map_err(|e| ConfigError::Invalid(format!("temporary_permit: {e}")))
    }

    #[must_use]
    pub fn cache_ttl(&self) -> chrono::Duration {
        i64::try_from(self.cache.ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(DEFAULT_CACHE_TTL)
    }

    #[must_use]
    pub fn dependency_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.dependency_timeout_ms)
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl std::str::FromStr for Config {
    type Err = ConfigError;

    fn from_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }
}
