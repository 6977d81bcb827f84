use super::lenient;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A person who can owe money. Balances are never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub phone: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub note: String,
    #[serde(default, with = "lenient::timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient::timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Customer {
    pub fn new(name: String, phone: String, note: String) -> Self {
        Self {
            id: ObjectId::new(),
            name,
            phone,
            note,
            created_at: Some(Utc::now()),
            updated_at: None,
        }
    }
}

/// Replacement values for the editable customer fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerChanges {
    pub name: String,
    pub phone: String,
    pub note: String,
    pub updated_at: DateTime<Utc>,
}
