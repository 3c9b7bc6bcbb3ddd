//! Request and response bodies.
//!
//! Request fields default to empty so a missing field is reported by the
//! explicit per-field checks rather than as a parse failure. Unknown request
//! fields, such as the `note` older clients send, are ignored.

use quickcert_types::{CertificateRecord, SerialNumber};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyCertRequest {
    pub serial_number: String,
    pub board_producer: String,
    pub board_name: String,
    pub mac_address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyTempPermitRequest {
    pub board_producer: String,
    pub board_name: String,
    pub mac_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyCertResponse {
    pub key: String,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyTempPermitResponse {
    pub status: String,
    pub remaining_time: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateSnRequest {
    pub serial_number: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateSnRequest {
    pub count: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateNoteRequest {
    pub serial_number: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSnResponse {
    pub msg: String,
    pub serial_number: SerialNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateSnResponse {
    pub msg: String,
    pub serial_numbers: Vec<SerialNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteResponse {
    pub msg: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllRecordsResponse {
    pub data: Vec<CertificateRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSnResponse {
    pub data: Vec<SerialNumber>,
}
