use super::lenient;
use crate::ledger::{amount, CustomerKey, EntryKind, LedgerEntry, MAX_ENTRY_AMOUNT};
use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

/// A stored transaction row, as loose as the data it reads.
///
/// `customerId`, `type` and `amount` are kept as raw BSON: old rows hold
/// ObjectIds or strings, legacy tag spellings or no tag, and occasionally a
/// non-numeric amount. Interpretation lives in [`crate::ledger`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "lenient::value", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Bson>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient::value",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<Bson>,
    #[serde(default, deserialize_with = "lenient::value", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Bson>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub note: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub invoice_image_url: Option<String>,
    /// Older field name for the invoice link.
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub invoice_url: Option<String>,
    #[serde(default, with = "lenient::timestamp", skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Why a new transaction could not be built.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NewTransactionError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("amount exceeds the per-entry limit")]
    TooLarge,
    #[error("amount cannot be stored")]
    Unrepresentable,
}

impl From<NewTransactionError> for AppError {
    fn from(err: NewTransactionError) -> Self {
        AppError::BadRequest(anyhow::anyhow!(err))
    }
}

impl TransactionRecord {
    /// A new row in canonical form: lowercase kind, hex customer reference,
    /// positive amount rounded to cents, `date` and `createdAt` both now.
    pub fn new(
        customer: &CustomerKey,
        kind: EntryKind,
        amount: Decimal,
        note: String,
        invoice_image_url: Option<String>,
    ) -> Result<Self, NewTransactionError> {
        let amount = amount::round_money(amount);
        if amount <= Decimal::ZERO {
            return Err(NewTransactionError::NonPositiveAmount);
        }
        if amount > MAX_ENTRY_AMOUNT {
            return Err(NewTransactionError::TooLarge);
        }
        let stored = amount::to_stored(amount).ok_or(NewTransactionError::Unrepresentable)?;
        let now = Utc::now();

        Ok(Self {
            id: ObjectId::new(),
            customer_id: Some(Bson::String(customer.as_str().to_string())),
            kind: Some(Bson::String(kind.as_str().to_string())),
            amount: Some(Bson::Double(stored)),
            note,
            invoice_image_url: invoice_image_url.filter(|url| !url.trim().is_empty()),
            invoice_url: None,
            date: Some(now),
            created_at: Some(now),
        })
    }

    /// Invoice link under either field name.
    pub fn invoice(&self) -> Option<&str> {
        self.invoice_image_url
            .as_deref()
            .or(self.invoice_url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

impl LedgerEntry for TransactionRecord {
    fn customer_key(&self) -> Option<CustomerKey> {
        self.customer_id.as_ref().and_then(CustomerKey::from_bson)
    }

    fn type_tag(&self) -> Option<&str> {
        match &self.kind {
            Some(Bson::String(tag)) => Some(tag.as_str()),
            _ => None,
        }
    }

    fn amount(&self) -> Option<Decimal> {
        self.amount.as_ref().and_then(amount::amount_from_bson)
    }

    fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}
