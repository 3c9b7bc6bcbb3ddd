//! Admin routes over the serial number inventory.

use super::error::ApiError;
use super::models::{
    AllRecordsResponse, AvailableSnResponse, CreateSnRequest, CreateSnResponse, GenerateSnRequest,
    GenerateSnResponse, UpdateNoteRequest, UpdateNoteResponse,
};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use quickcert_types::SerialNumber;
use tracing::info;

fn parse_serial(raw: String) -> Result<SerialNumber, ApiError> {
    ApiError::require("serial_number", &raw)?;
    SerialNumber::new(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

/// `POST /api/sn/create`
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateSnRequest>, JsonRejection>,
) -> Result<Json<CreateSnResponse>, ApiError> {
    let Json(req) = body?;
    let serial = parse_serial(req.serial_number)?;

    state.inventory.create(&serial).await?;
    info!(serial_number = %serial, reason = %req.reason, "Provisioned S/N");

    Ok(Json(CreateSnResponse {
        msg: "Successfully uploaded a new S/N.".to_string(),
        serial_number: serial,
    }))
}

/// `POST /api/sn/generate`
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateSnRequest>, JsonRejection>,
) -> Result<Json<GenerateSnResponse>, ApiError> {
    let Json(req) = body?;
    let count = usize::try_from(req.count)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| ApiError::bad_request("The count must be greater than 0."))?;

    let serials = state.inventory.generate(count).await?;
    info!(count, reason = %req.reason, "Generated S/Ns");

    Ok(Json(GenerateSnResponse {
        msg: format!("Successfully generated {count} S/N(s)."),
        serial_numbers: serials,
    }))
}

/// `POST /api/sn/update`
pub async fn update_note(
    State(state): State<AppState>,
    body: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> Result<Json<UpdateNoteResponse>, ApiError> {
    let Json(req) = body?;
    let serial = parse_serial(req.serial_number)?;
    ApiError::require("note", &req.note)?;

    state.inventory.update_note(&serial, &req.note).await?;
    info!(serial_number = %serial, "Updated S/N note");

    Ok(Json(UpdateNoteResponse {
        msg: "Successfully updated the note of specified S/N.".to_string(),
        note: req.note,
    }))
}

/// `GET /api/sn/get-available`
pub async fn get_available(State(state): State<AppState>) -> Result<Json<AvailableSnResponse>, ApiError> {
    Ok(Json(AvailableSnResponse {
        data: state.inventory.list_unbound().await?,
    }))
}

/// `GET /api/sn/get-all`
pub async fn get_all(State(state): State<AppState>) -> Result<Json<AllRecordsResponse>, ApiError> {
    Ok(Json(AllRecordsResponse {
        data: state.inventory.list_all().await?,
    }))
}
