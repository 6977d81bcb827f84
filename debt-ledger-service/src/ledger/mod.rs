//! Pure balance computation over stored transactions.
//!
//! Nothing here touches the store. Balances are never persisted; every read
//! folds the current rows from scratch, so deleting a row is reflected on the
//! next read without any maintenance step.

pub mod aggregate;
pub mod amount;
pub mod classify;
pub mod customer_key;
pub mod ordering;
pub mod summary;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub use aggregate::{aggregate, stats_by_customer, CustomerBalance, CustomerStats};
pub use amount::{amount_from_bson, magnitude, round_money, MAX_ENTRY_AMOUNT};
pub use classify::{classify, Basis, Classification, EntryKind};
pub use customer_key::CustomerKey;
pub use ordering::newest_first;
pub use summary::{summarize, SystemSummary};

/// Read-side view of one stored transaction row, whatever its vintage.
pub trait LedgerEntry {
    fn customer_key(&self) -> Option<CustomerKey>;
    fn type_tag(&self) -> Option<&str>;
    /// Numeric amount, `None` when missing or unusable.
    fn amount(&self) -> Option<Decimal>;
    fn date(&self) -> Option<DateTime<Utc>>;
    fn created_at(&self) -> Option<DateTime<Utc>>;

    fn classification(&self) -> Classification {
        classify(self.type_tag(), self.amount())
    }

    /// Logical date shown to users: `date`, else `createdAt`.
    fn effective_date(&self) -> Option<DateTime<Utc>> {
        self.date().or_else(|| self.created_at())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Minimal in-memory row for exercising the fold.
    #[derive(Debug, Clone, Default)]
    pub struct Row {
        pub customer: Option<&'static str>,
        pub tag: Option<&'static str>,
        pub amount: Option<Decimal>,
        pub date: Option<DateTime<Utc>>,
        pub created_at: Option<DateTime<Utc>>,
    }

    pub fn row(customer: &'static str, tag: Option<&'static str>, amount: &str) -> Row {
        Row {
            customer: Some(customer),
            tag,
            amount: amount.parse().ok(),
            ..Row::default()
        }
    }

    pub fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    impl LedgerEntry for Row {
        fn customer_key(&self) -> Option<CustomerKey> {
            self.customer.and_then(CustomerKey::parse)
        }
        fn type_tag(&self) -> Option<&str> {
            self.tag
        }
        fn amount(&self) -> Option<Decimal> {
            self.amount
        }
        fn date(&self) -> Option<DateTime<Utc>> {
            self.date
        }
        fn created_at(&self) -> Option<DateTime<Utc>> {
            self.created_at
        }
    }
}
