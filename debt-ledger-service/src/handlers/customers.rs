use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use validator::Validate;

use super::{json_body, object_id};
use crate::dtos::{
    AddCustomerRequest, CustomerDetailResponse, CustomerQuery, CustomerSummaryResponse,
    DeleteCustomerRequest, TransactionView, UpdateCustomerRequest, WriteResponse,
};
use crate::ledger::{aggregate, newest_first, stats_by_customer, CustomerKey};
use crate::models::{Customer, CustomerChanges};
use crate::startup::AppState;
use service_core::error::AppError;

fn customer_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Customer not found"))
}

fn optional_text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Every customer with balances computed from current transactions.
#[tracing::instrument(skip(state))]
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerSummaryResponse>>, AppError> {
    let customers = state.store.list_customers().await?;
    let transactions = state.store.list_transactions().await?;
    let stats = stats_by_customer(&transactions);

    let response = customers
        .iter()
        .map(|customer| {
            let totals = stats
                .get(&CustomerKey::from_object_id(&customer.id))
                .copied()
                .unwrap_or_default()
                .to_balance();
            CustomerSummaryResponse::new(customer, totals)
        })
        .collect();

    Ok(Json(response))
}

/// One customer with balances and history. Unknown and malformed ids are
/// both "not found".
#[tracing::instrument(skip(state))]
pub async fn get_customer(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<CustomerDetailResponse>, AppError> {
    let raw_id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Customer ID is required")))?;
    let id = ObjectId::parse_str(raw_id.trim()).map_err(|_| customer_not_found())?;

    let customer = state
        .store
        .find_customer(&id)
        .await?
        .ok_or_else(customer_not_found)?;

    let mut transactions = state
        .store
        .transactions_for(&CustomerKey::from_object_id(&id))
        .await?;
    let totals = aggregate(&transactions).to_balance();
    newest_first(&mut transactions);

    Ok(Json(CustomerDetailResponse {
        customer: CustomerSummaryResponse::new(&customer, totals),
        transactions: transactions.iter().map(TransactionView::from).collect(),
    }))
}

#[tracing::instrument(skip(state, payload))]
pub async fn add_customer(
    State(state): State<AppState>,
    payload: Result<Json<AddCustomerRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<WriteResponse>), AppError> {
    let request = json_body(payload)?;
    request.validate()?;

    let customer = Customer::new(
        request.name.trim().to_string(),
        optional_text(request.phone),
        optional_text(request.note),
    );
    state.store.insert_customer(&customer).await?;
    tracing::info!(customer_id = %customer.id, "Customer added");

    Ok((
        StatusCode::CREATED,
        Json(WriteResponse::ok("Customer added successfully").with_customer(customer.id.to_hex())),
    ))
}

#[tracing::instrument(skip(state, payload))]
pub async fn update_customer(
    State(state): State<AppState>,
    payload: Result<Json<UpdateCustomerRequest>, JsonRejection>,
) -> Result<Json<WriteResponse>, AppError> {
    let request = json_body(payload)?;
    request.validate()?;
    let id = object_id(&request.customer_id)?;

    let changes = CustomerChanges {
        name: request.name.trim().to_string(),
        phone: optional_text(request.phone),
        note: optional_text(request.note),
        updated_at: Utc::now(),
    };
    if !state.store.update_customer(&id, &changes).await? {
        return Err(customer_not_found());
    }
    tracing::info!(customer_id = %id, "Customer updated");

    Ok(Json(
        WriteResponse::ok("Customer updated successfully").with_customer(id.to_hex()),
    ))
}

/// Delete a customer and all of their transactions.
#[tracing::instrument(skip(state, payload))]
pub async fn delete_customer(
    State(state): State<AppState>,
    payload: Result<Json<DeleteCustomerRequest>, JsonRejection>,
) -> Result<Json<WriteResponse>, AppError> {
    let request = json_body(payload)?;
    request.validate()?;
    let id = object_id(&request.customer_id)?;

    let removed = state
        .store
        .delete_customer(&id)
        .await?
        .ok_or_else(customer_not_found)?;
    tracing::info!(customer_id = %id, transactions_removed = removed, "Customer deleted");

    Ok(Json(
        WriteResponse::ok("Customer deleted successfully")
            .with_customer(id.to_hex())
            .with_removed(removed),
    ))
}
