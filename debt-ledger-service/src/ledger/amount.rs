use mongodb::bson::Bson;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

/// Largest amount a single new entry may carry (one trillion).
pub const MAX_ENTRY_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Numeric value of a stored amount.
///
/// Doubles and integers are usable; anything else (missing, strings, NaN,
/// infinities, Decimal128) is not and contributes zero to every sum.
pub fn amount_from_bson(value: &Bson) -> Option<Decimal> {
    match value {
        Bson::Double(v) if v.is_finite() => Decimal::from_f64(*v),
        Bson::Int32(v) => Some(Decimal::from(*v)),
        Bson::Int64(v) => Some(Decimal::from(*v)),
        _ => None,
    }
}

/// Absolute value used for every sum; sign only matters for classification.
pub fn magnitude(amount: Option<Decimal>) -> Decimal {
    amount.map(|v| v.abs()).unwrap_or(Decimal::ZERO)
}

/// Round a published money figure to two places, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Stored representation of an already-rounded amount.
pub fn to_stored(value: Decimal) -> Option<f64> {
    value.to_f64().filter(|v| v.is_finite())
}
