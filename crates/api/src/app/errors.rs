use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use wayfarer_core::DomainError;
use wayfarer_infra::{NumberingError, StoreError};

/// Successful response: `{ "success": true, "data": ... }`.
pub fn json_ok(status: StatusCode, data: impl Serialize) -> Response {
    (status, Json(json!({ "success": true, "data": data }))).into_response()
}

/// Failed response: `{ "success": false, "error": code, "message": ... }`.
pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn numbering_error_to_response(err: NumberingError) -> Response {
    match err {
        NumberingError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "document not found"),
        NumberingError::Domain(e) => domain_error_to_response(e),
        NumberingError::Exhausted { .. } => {
            tracing::error!(error = %err, "document numbering gave up");
            json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "numbering_contention",
                err.to_string(),
            )
        }
        NumberingError::Store(e) => store_error_to_response(e),
    }
}

fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::MalformedNumber { .. } => {
            tracing::error!(error = %err, "stored document number is malformed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "malformed_number", err.to_string())
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

fn store_error_to_response(err: StoreError) -> Response {
    tracing::error!(error = %err, "document store failure");
    match err {
        StoreError::DuplicateNumber { .. } => {
            json_error(StatusCode::CONFLICT, "duplicate_number", err.to_string())
        }
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "document not found"),
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Unavailable(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", err.to_string())
        }
        StoreError::Corrupt(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
        }
    }
}
