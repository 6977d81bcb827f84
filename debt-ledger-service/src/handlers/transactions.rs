use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use super::{json_body, object_id};
use crate::dtos::validation::parse_amount;
use crate::dtos::{AddDebtRequest, AddPaymentRequest, DeleteTransactionRequest, WriteResponse};
use crate::ledger::{CustomerKey, EntryKind};
use crate::models::TransactionRecord;
use crate::services::metrics::record_transaction_written;
use crate::startup::AppState;
use service_core::error::AppError;

/// Shared write path for debts and payments: the customer must exist and the
/// row is stored in canonical form.
async fn record_transaction(
    state: &AppState,
    customer_id: &str,
    kind: EntryKind,
    amount: &serde_json::Value,
    note: Option<String>,
    invoice_image_url: Option<String>,
) -> Result<TransactionRecord, AppError> {
    let id = object_id(customer_id)?;
    let amount = parse_amount(amount)
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Invalid amount")))?;

    if state.store.find_customer(&id).await?.is_none() {
        return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
    }

    let record = TransactionRecord::new(
        &CustomerKey::from_object_id(&id),
        kind,
        amount,
        note.map(|n| n.trim().to_string()).unwrap_or_default(),
        invoice_image_url.map(|url| url.trim().to_string()),
    )?;
    state.store.insert_transaction(&record).await?;
    record_transaction_written(kind);
    tracing::info!(
        transaction_id = %record.id,
        customer_id = %id,
        kind = %kind,
        %amount,
        "Transaction recorded"
    );

    Ok(record)
}

#[tracing::instrument(skip(state, payload))]
pub async fn add_debt(
    State(state): State<AppState>,
    payload: Result<Json<AddDebtRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WriteResponse>), AppError> {
    let request = json_body(payload)?;
    request.validate()?;

    let record = record_transaction(
        &state,
        &request.customer_id,
        EntryKind::Debit,
        &request.amount,
        request.note,
        request.invoice_image_url,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(WriteResponse::ok("Debt added successfully").with_transaction(record.id.to_hex())),
    ))
}

#[tracing::instrument(skip(state, payload))]
pub async fn add_payment(
    State(state): State<AppState>,
    payload: Result<Json<AddPaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WriteResponse>), AppError> {
    let request = json_body(payload)?;
    request.validate()?;

    let record = record_transaction(
        &state,
        &request.customer_id,
        EntryKind::Credit,
        &request.amount,
        request.note,
        None,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(
            WriteResponse::ok("Payment added successfully").with_transaction(record.id.to_hex()),
        ),
    ))
}

/// Remove one row; balances follow on the next read.
#[tracing::instrument(skip(state, payload))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    payload: Result<Json<DeleteTransactionRequest>, JsonRejection>,
) -> Result<Json<WriteResponse>, AppError> {
    let request = json_body(payload)?;
    request.validate()?;
    let id = object_id(&request.transaction_id)?;

    if !state.store.delete_transaction(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Transaction not found")));
    }
    tracing::info!(transaction_id = %id, "Transaction deleted");

    Ok(Json(
        WriteResponse::ok("Transaction deleted successfully").with_transaction(id.to_hex()),
    ))
}
