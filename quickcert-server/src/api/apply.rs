//! Client routes: certificate and temporary permit applications.

use super::error::ApiError;
use super::models::{ApplyCertRequest, ApplyCertResponse, ApplyTempPermitRequest, ApplyTempPermitResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use quickcert_issuance::{IssuanceError, PermitStatus};
use quickcert_types::{HardwareInfo, SerialNumber};
use tracing::{info, warn};

fn hardware(board_producer: String, board_name: String, mac_address: String) -> Result<HardwareInfo, ApiError> {
    ApiError::require("board_producer", &board_producer)?;
    ApiError::require("board_name", &board_name)?;
    ApiError::require("mac_address", &mac_address)?;
    Ok(HardwareInfo::new(board_producer, board_name, mac_address))
}

/// `POST /api/apply/cert`
pub async fn apply_certificate(
    State(state): State<AppState>,
    body: Result<Json<ApplyCertRequest>, JsonRejection>,
) -> Result<Json<ApplyCertResponse>, ApiError> {
    let Json(req) = body?;
    ApiError::require("serial_number", &req.serial_number)?;
    let serial = SerialNumber::new(req.serial_number)
        .map_err(|_| ApiError::bad_request("The S/N does not exist."))?;
    let hardware = hardware(req.board_producer, req.board_name, req.mac_address)?;

    match state.issuance.apply_certificate(&serial, &hardware).await {
        Ok(cert) => {
            info!(serial_number = %serial, key = %cert.key, "Issued certificate");
            Ok(Json(ApplyCertResponse {
                key: cert.key.to_string(),
                signature: cert.signature,
            }))
        }
        Err(e) => {
            if matches!(e, IssuanceError::NotFoundOrAlreadyBound) {
                warn!(serial_number = %serial, "S/N does not exist or has already been used");
            }
            Err(e.into())
        }
    }
}

/// `POST /api/apply/temp-permit`
pub async fn apply_temporary_permit(
    State(state): State<AppState>,
    body: Result<Json<ApplyTempPermitRequest>, JsonRejection>,
) -> Result<Json<ApplyTempPermitResponse>, ApiError> {
    let Json(req) = body?;
    let hardware = hardware(req.board_producer, req.board_name, req.mac_address)?;

    let status = state.issuance.apply_temporary_permit(&hardware).await?;
    match status {
        PermitStatus::Activated { remaining_secs } => {
            info!(remaining_secs, "Temporary permit active");
        }
        PermitStatus::Expired => info!("Temporary permit expired"),
    }

    Ok(Json(ApplyTempPermitResponse {
        status: status.as_str().to_string(),
        remaining_time: status.remaining_secs(),
    }))
}
