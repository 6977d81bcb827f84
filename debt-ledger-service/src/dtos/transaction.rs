use super::validation::{validate_amount, validate_object_id};
use crate::ledger::{round_money, magnitude, EntryKind, LedgerEntry};
use crate::models::TransactionRecord;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddDebtRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_object_id"))]
    pub customer_id: String,

    /// Kept as raw JSON so a string or missing amount is a validation error
    /// rather than a body rejection.
    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    pub amount: serde_json::Value,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Note is too long"))]
    pub note: Option<String>,

    #[serde(default)]
    #[validate(length(max = 2048, message = "Invoice URL is too long"))]
    pub invoice_image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddPaymentRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_object_id"))]
    pub customer_id: String,

    #[serde(default)]
    #[validate(custom(function = "validate_amount"))]
    pub amount: serde_json::Value,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Note is too long"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTransactionRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_object_id"))]
    pub transaction_id: String,
}

/// One row of a customer's history, normalized for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub note: String,
    pub invoice_image_url: Option<String>,
    /// `date`, else `createdAt`; null when the row has neither.
    pub date: Option<DateTime<Utc>>,
    /// Classified by amount sign because the type tag was missing or unknown.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub suspect: bool,
}

impl From<&TransactionRecord> for TransactionView {
    fn from(record: &TransactionRecord) -> Self {
        let classification = record.classification();
        Self {
            id: record.id.to_hex(),
            kind: classification.kind,
            amount: round_money(magnitude(record.amount())),
            note: record.note.clone(),
            invoice_image_url: record.invoice().map(str::to_string),
            date: record.effective_date(),
            suspect: classification.is_suspect(),
        }
    }
}
