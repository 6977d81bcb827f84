use mongodb::bson::{oid::ObjectId, Bson};
use std::fmt;

/// Canonical identity of the customer a transaction belongs to.
///
/// Transactions have stored the reference both as an ObjectId and as its hex
/// string. Both forms collapse to the lowercase hex so they group together.
/// Strings that are not ObjectIds are kept verbatim (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomerKey(String);

impl CustomerKey {
    pub fn from_object_id(id: &ObjectId) -> Self {
        Self(id.to_hex())
    }

    /// Canonicalize a textual reference. Empty input has no key.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match ObjectId::parse_str(raw) {
            Ok(id) => Some(Self::from_object_id(&id)),
            Err(_) => Some(Self(raw.to_string())),
        }
    }

    /// Canonicalize a stored `customerId` of any shape.
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::ObjectId(id) => Some(Self::from_object_id(id)),
            Bson::String(s) => Self::parse(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        ObjectId::parse_str(&self.0).ok()
    }

    /// Stored values that reference this customer: the string and, when the
    /// key is an ObjectId, the native form too.
    pub fn stored_forms(&self) -> Vec<Bson> {
        let mut forms = vec![Bson::String(self.0.clone())];
        if let Some(id) = self.object_id() {
            forms.push(Bson::ObjectId(id));
        }
        forms
    }

    /// Anchored pattern for string references that canonicalize to this key
    /// but are not stored in canonical form (uppercase hex, padded). Only
    /// ObjectId keys have one; with `$options: "i"` it matches every string
    /// that [`CustomerKey::parse`] maps to this key.
    pub fn loose_string_pattern(&self) -> Option<String> {
        self.object_id().map(|_| format!(r"^\s*{}\s*$", self.0))
    }
}

impl fmt::Display for CustomerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ObjectId> for CustomerKey {
    fn from(id: &ObjectId) -> Self {
        Self::from_object_id(id)
    }
}
