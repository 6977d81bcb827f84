//! Transaction classification.
//!
//! Every stored row resolves to exactly one of two canonical kinds. The legacy
//! tag spellings are an explicit alias table; rows whose tag is missing or
//! unknown fall back to the sign of the amount and are reported as suspect.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Money owed to the business.
    Debit,
    /// Money received from the customer.
    Credit,
}

/// Every tag spelling observed in stored data, compared case-insensitively.
const TYPE_ALIASES: &[(&str, EntryKind)] = &[
    ("debit", EntryKind::Debit),
    ("debt", EntryKind::Debit),
    ("credit", EntryKind::Credit),
    ("payment", EntryKind::Credit),
];

impl EntryKind {
    /// Resolve a stored tag through the alias table.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        TYPE_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(tag))
            .map(|(_, kind)| *kind)
    }

    /// Canonical spelling written by every new row.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the classification was based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    /// The tag matched the alias table.
    Tag,
    /// The tag was missing or unknown; the amount's sign decided.
    SignFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: EntryKind,
    pub basis: Basis,
}

impl Classification {
    pub fn is_suspect(&self) -> bool {
        self.basis == Basis::SignFallback
    }
}

/// Classify a row from its stored tag and numeric amount.
///
/// Never fails. A negative amount under a missing or unknown tag is a Debit;
/// zero, positive and unusable amounts are Credit.
pub fn classify(tag: Option<&str>, amount: Option<Decimal>) -> Classification {
    if let Some(kind) = tag.and_then(EntryKind::from_tag) {
        return Classification {
            kind,
            basis: Basis::Tag,
        };
    }

    let kind = match amount {
        Some(value) if value.is_sign_negative() && !value.is_zero() => EntryKind::Debit,
        _ => EntryKind::Credit,
    };

    Classification {
        kind,
        basis: Basis::SignFallback,
    }
}

/// Report a row that reached the sign fallback.
///
/// A non-empty tag outside the alias table is a spelling nobody has seen
/// before; it is logged at `warn` and counted so it can be added explicitly.
pub(crate) fn flag_fallback(tag: Option<&str>, kind: EntryKind) {
    match tag.map(str::trim).filter(|t| !t.is_empty()) {
        Some(unknown) => {
            tracing::warn!(
                type_tag = %unknown,
                classified_as = %kind,
                "Unrecognized transaction type; classified by amount sign"
            );
            metrics::counter!("ledger_unrecognized_type_total").increment(1);
        }
        None => {
            tracing::debug!(classified_as = %kind, "Untyped transaction classified by amount sign");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn debit_aliases_in_any_case() {
        for tag in ["debit", "debt", "DEBT", "Debit", "DeBiT", " debt "] {
            let c = classify(Some(tag), Some(dec("10")));
            assert_eq!(c.kind, EntryKind::Debit, "tag {tag:?}");
            assert_eq!(c.basis, Basis::Tag);
        }
    }

    #[test]
    fn credit_aliases_in_any_case() {
        for tag in ["credit", "payment", "PAYMENT", "Credit", "CREDIT"] {
            let c = classify(Some(tag), Some(dec("10")));
            assert_eq!(c.kind, EntryKind::Credit, "tag {tag:?}");
            assert!(!c.is_suspect());
        }
    }

    #[test]
    fn tag_wins_over_sign() {
        assert_eq!(
            classify(Some("DEBT"), Some(dec("-25"))).kind,
            EntryKind::Debit
        );
        assert_eq!(
            classify(Some("payment"), Some(dec("-25"))).kind,
            EntryKind::Credit
        );
    }

    #[test]
    fn missing_tag_uses_sign() {
        let negative = classify(None, Some(dec("-15")));
        assert_eq!(negative.kind, EntryKind::Debit);
        assert!(negative.is_suspect());

        assert_eq!(classify(None, Some(dec("15"))).kind, EntryKind::Credit);
    }

    #[test]
    fn zero_and_unusable_amounts_are_credit() {
        assert_eq!(classify(None, Some(Decimal::ZERO)).kind, EntryKind::Credit);
        assert_eq!(classify(None, Some(dec("-0.00"))).kind, EntryKind::Credit);
        assert_eq!(classify(None, None).kind, EntryKind::Credit);
    }

    #[test]
    fn unknown_and_empty_tags_fall_back() {
        let unknown = classify(Some("refund"), Some(dec("-3")));
        assert_eq!(unknown.kind, EntryKind::Debit);
        assert_eq!(unknown.basis, Basis::SignFallback);

        let empty = classify(Some(""), Some(dec("3")));
        assert_eq!(empty.kind, EntryKind::Credit);
        assert!(empty.is_suspect());
    }

    #[test]
    fn canonical_spelling_round_trips_through_aliases() {
        for kind in [EntryKind::Debit, EntryKind::Credit] {
            assert_eq!(EntryKind::from_tag(kind.as_str()), Some(kind));
        }
    }
}
