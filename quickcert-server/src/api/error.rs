//! JSON error responses.

use super::models::ErrorResponse;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use quickcert_issuance::{Dependency, IssuanceError};
use tracing::{error, warn};

/// Error returned by every handler, rendered as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized Request.")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error.")
    }

    pub fn invalid_format() -> Self {
        Self::bad_request("Invalid data format.")
    }

    /// Rejects an empty required field.
    pub fn require(field: &str, value: &str) -> Result<(), Self> {
        if value.is_empty() {
            return Err(Self::bad_request(format!("Missing required field: {field}.")));
        }
        Ok(())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(reason = %rejection.body_text(), "Rejected request body");
        Self::invalid_format()
    }
}

impl From<IssuanceError> for ApiError {
    fn from(err: IssuanceError) -> Self {
        match &err {
            IssuanceError::Validation(msg) => Self::bad_request(msg.clone()),
            IssuanceError::SerialNumberNotFound(sn) => {
                warn!(serial_number = %sn, "S/N does not exist");
                Self::bad_request("The S/N does not exist.")
            }
            IssuanceError::NotFoundOrAlreadyBound => {
                Self::bad_request("The S/N does not exist or has already been used.")
            }
            IssuanceError::SerialNumberExists(sn) => {
                warn!(serial_number = %sn, "S/N already exists");
                Self::bad_request("The S/N already exists.")
            }
            IssuanceError::SomeSerialNumbersExist => Self::bad_request("Some S/Ns already exist."),
            IssuanceError::Connectivity { dependency, reason } => {
                error!(%dependency, %reason, "Dependency unavailable");
                match dependency {
                    Dependency::Cache => Self::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Currently not connected to the cache.",
                    ),
                    Dependency::Storage => Self::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Currently not connected to the database.",
                    ),
                }
            }
            IssuanceError::Signing(_) | IssuanceError::Storage(_) => {
                error!(error = %err, "Request failed");
                Self::internal()
            }
        }
    }
}
