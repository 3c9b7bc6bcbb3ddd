//! Serial numbers.

use crate::fingerprint::{FIELD_SEPARATOR, TRIAL_PLACEHOLDER};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of hex digits in a generated serial number.
const GENERATED_DIGITS: usize = 24;
/// Digits per dash-separated group.
const GROUP_LEN: usize = 4;

/// A vendor-provisioned serial number.
///
/// Any non-empty string is accepted except the trial placeholder and values
/// containing the fingerprint separator, either of which would let two
/// different devices share a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SerialNumber(String);

impl SerialNumber {
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(Error::InvalidSerialNumber("serial number is empty".to_string()));
        }
        if s == TRIAL_PLACEHOLDER {
            return Err(Error::InvalidSerialNumber(format!(
                "{TRIAL_PLACEHOLDER:?} is reserved for trial devices"
            )));
        }
        if s.contains(FIELD_SEPARATOR) {
            return Err(Error::InvalidSerialNumber(format!(
                "serial number must not contain {FIELD_SEPARATOR:?}"
            )));
        }
        Ok(Self(s))
    }

    /// Generates a random serial number such as `779f-4e90-aebd-4295-881a-f8d7`.
    ///
    /// The digits are the first 24 hex characters of a UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        let digits = Uuid::new_v4().simple().to_string();
        let groups: Vec<&str> = digits.as_bytes()[..GENERATED_DIGITS]
            .chunks(GROUP_LEN)
            // UUID simple form is ASCII hex, so every chunk is valid UTF-8.
            .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
            .collect();
        Self(groups.join("-"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SerialNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SerialNumber {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<SerialNumber> for String {
    fn from(sn: SerialNumber) -> Self {
        sn.0
    }
}
