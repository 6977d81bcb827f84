//! HTTP handlers for debt-ledger-service.

pub mod customers;
pub mod health;
pub mod summary;
pub mod transactions;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;

/// Unwrap a JSON body, turning malformed input into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        AppError::BadRequest(anyhow::anyhow!("Invalid input"))
    })
}

/// Parse an id that has already passed validation.
pub(crate) fn object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid ID format")))
}
