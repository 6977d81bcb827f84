use crate::ledger::{round_money, MAX_ENTRY_AMOUNT};
use mongodb::bson::oid::ObjectId;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::borrow::Cow;
use validator::ValidationError;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn validate_required_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", "Customer name is required"));
    }
    Ok(())
}

pub fn validate_object_id(value: &str) -> Result<(), ValidationError> {
    ObjectId::parse_str(value.trim())
        .map(|_| ())
        .map_err(|_| invalid("object_id", "Invalid ID format"))
}

pub fn validate_amount(value: &serde_json::Value) -> Result<(), ValidationError> {
    match parse_amount(value) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "amount",
            "Amount must be a number between 0.01 and 1000000000000",
        )),
    }
}

/// A JSON number that is finite, still positive after rounding to cents and
/// no larger than [`MAX_ENTRY_AMOUNT`].
pub fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .and_then(Decimal::from_f64)
        .map(round_money)
        .filter(|v| *v > Decimal::ZERO && *v <= MAX_ENTRY_AMOUNT)
}
