use axum::{extract::State, Json};

use crate::ledger::SystemSummary;
use crate::startup::AppState;
use service_core::error::AppError;

/// Dashboard totals across every customer and transaction.
#[tracing::instrument(skip(state))]
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SystemSummary>, AppError> {
    let summary = state.store.system_summary().await?;
    tracing::debug!(
        customers = summary.total_customers,
        debtors = summary.total_debtors,
        "Summary computed"
    );
    Ok(Json(summary))
}
