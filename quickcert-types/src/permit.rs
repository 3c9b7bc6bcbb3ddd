//! Temporary (trial) permits.

use crate::key::DeviceKey;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit of the configured trial length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PermitTimeUnit {
    Day,
    Hour,
    Minute,
    Second,
}

impl PermitTimeUnit {
    /// Length of one unit in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Day => 24 * 60 * 60,
            Self::Hour => 60 * 60,
            Self::Minute => 60,
            Self::Second => 1,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }
}

impl fmt::Display for PermitTimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermitTimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            "minute" => Ok(Self::Minute),
            "second" => Ok(Self::Second),
            _ => Err(Error::InvalidTimeUnit(s.to_string())),
        }
    }
}

impl TryFrom<String> for PermitTimeUnit {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<PermitTimeUnit> for String {
    fn from(unit: PermitTimeUnit) -> Self {
        unit.as_str().to_string()
    }
}

/// How long a newly granted trial lasts: `amount * unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitDuration {
    amount: u32,
    unit: PermitTimeUnit,
}

impl PermitDuration {
    /// Fails on a zero amount.
    pub fn new(amount: u32, unit: PermitTimeUnit) -> Result<Self> {
        if amount == 0 {
            return Err(Error::InvalidDuration(
                "temporary permit time must be greater than 0".to_string(),
            ));
        }
        Ok(Self { amount, unit })
    }

    #[must_use]
    pub const fn amount(&self) -> u32 {
        self.amount
    }

    #[must_use]
    pub const fn unit(&self) -> PermitTimeUnit {
        self.unit
    }

    /// Total length in seconds.
    #[must_use]
    pub const fn as_secs(&self) -> i64 {
        self.amount as i64 * self.unit.seconds()
    }

    #[must_use]
    pub fn as_chrono(&self) -> Duration {
        Duration::seconds(self.as_secs())
    }
}

/// Seven days.
impl Default for PermitDuration {
    fn default() -> Self {
        Self {
            amount: 7,
            unit: PermitTimeUnit::Day,
        }
    }
}

impl fmt::Display for PermitDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(s)", self.amount, self.unit)
    }
}

/// A trial grant for one device key.
///
/// The expiration is fixed when the permit is created; repeated requests
/// never extend it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryPermit {
    pub key: DeviceKey,
    pub expiration: DateTime<Utc>,
}

impl TemporaryPermit {
    /// Seconds left at `now`, negative once expired.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        self.expiration.timestamp() - now.timestamp()
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) <= 0
    }
}
