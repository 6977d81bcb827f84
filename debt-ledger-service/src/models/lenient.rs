//! Tolerant decoding of fields whose stored shape has drifted over time.
//!
//! A document must always decode; a field of the wrong type reads as absent.

use chrono::{DateTime, TimeZone, Utc};
use mongodb::bson::Bson;
use serde::{Deserialize, Deserializer};

/// Any stored value, `null` and missing both read as `None`.
pub fn value<'de, D>(deserializer: D) -> Result<Option<Bson>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Bson>::deserialize(deserializer)?.filter(|v| !matches!(v, Bson::Null)))
}

/// A string field; other shapes read as `None`.
pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Bson>::deserialize(deserializer)? {
        Some(Bson::String(s)) => Some(s),
        _ => None,
    })
}

/// A string field that reads as empty when absent.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string(deserializer)?.unwrap_or_default())
}

/// Interpret a stored timestamp: BSON dates, RFC 3339 strings and epoch
/// milliseconds have all been written at some point.
pub fn timestamp_from_bson(value: &Bson) -> Option<DateTime<Utc>> {
    match value {
        Bson::DateTime(dt) => Some(dt.to_chrono()),
        Bson::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|d| d.with_timezone(&Utc)),
        Bson::Int64(ms) => Utc.timestamp_millis_opt(*ms).single(),
        Bson::Double(ms) if ms.is_finite() => Utc.timestamp_millis_opt(*ms as i64).single(),
        _ => None,
    }
}

/// Optional timestamp written as a BSON date and read from any known shape.
pub mod timestamp {
    use super::timestamp_from_bson;
    use chrono::{DateTime, Utc};
    use mongodb::bson::Bson;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(val: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match val {
            Some(date) => {
                mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime::serialize(
                    date, serializer,
                )
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Bson>::deserialize(deserializer)?
            .as_ref()
            .and_then(timestamp_from_bson))
    }
}
