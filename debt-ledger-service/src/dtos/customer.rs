use super::transaction::TransactionView;
use super::validation::{validate_object_id, validate_required_name};
use crate::ledger::CustomerBalance;
use crate::models::Customer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCustomerRequest {
    #[serde(default)]
    #[validate(
        custom(function = "validate_required_name"),
        length(max = 200, message = "Customer name is too long")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 50, message = "Phone is too long"))]
    pub phone: Option<String>,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Note is too long"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_object_id"))]
    pub customer_id: String,

    #[serde(default)]
    #[validate(
        custom(function = "validate_required_name"),
        length(max = 200, message = "Customer name is too long")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 50, message = "Phone is too long"))]
    pub phone: Option<String>,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Note is too long"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCustomerRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_object_id"))]
    pub customer_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomerQuery {
    pub id: Option<String>,
}

/// Customer card in the list view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummaryResponse {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub note: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub totals: CustomerBalance,
}

impl CustomerSummaryResponse {
    pub fn new(customer: &Customer, totals: CustomerBalance) -> Self {
        Self {
            id: customer.id.to_hex(),
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            note: customer.note.clone(),
            created_at: customer.created_at,
            totals,
        }
    }
}

/// Customer with balances and full history, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetailResponse {
    #[serde(flatten)]
    pub customer: CustomerSummaryResponse,
    pub transactions: Vec<TransactionView>,
}
