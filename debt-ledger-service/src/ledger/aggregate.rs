use super::amount::{magnitude, round_money};
use super::classify::{flag_fallback, Classification, EntryKind};
use super::{CustomerKey, LedgerEntry};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Running sums for one customer (or the whole system).
///
/// Sums are exact; rounding happens only in [`CustomerStats::to_balance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CustomerStats {
    pub total_debt: Decimal,
    pub total_paid: Decimal,
    /// Number of Debit rows.
    pub receipts: u64,
}

impl CustomerStats {
    /// Fold one classified magnitude in. A magnitude that would push the
    /// total past the `Decimal` range is dropped with a warning; the row still
    /// counts as a receipt.
    pub fn add(&mut self, kind: EntryKind, magnitude: Decimal) {
        let total = match kind {
            EntryKind::Debit => {
                self.receipts += 1;
                &mut self.total_debt
            }
            EntryKind::Credit => &mut self.total_paid,
        };
        accumulate(total, magnitude, kind);
    }

    /// Fold another set of sums in, e.g. one pipeline group into the system
    /// totals.
    pub fn merge(&mut self, other: &CustomerStats) {
        accumulate(&mut self.total_debt, other.total_debt, EntryKind::Debit);
        accumulate(&mut self.total_paid, other.total_paid, EntryKind::Credit);
        self.receipts = self.receipts.saturating_add(other.receipts);
    }

    /// Classify `entry` and fold it in.
    pub fn record<E: LedgerEntry + ?Sized>(&mut self, entry: &E) -> Classification {
        let (classification, amount) = classify_entry(entry);
        self.add(classification.kind, amount);
        classification
    }

    pub fn balance(&self) -> Decimal {
        self.total_debt - self.total_paid
    }

    /// Positive balance: the customer still owes money.
    pub fn is_debtor(&self) -> bool {
        self.balance() > Decimal::ZERO
    }

    /// Published figures. The balance is the difference of the rounded
    /// totals so `totalDebt - totalPaid == balance` holds on the wire.
    pub fn to_balance(&self) -> CustomerBalance {
        let total_debt = round_money(self.total_debt);
        let total_paid = round_money(self.total_paid);
        CustomerBalance {
            total_debt,
            total_paid,
            balance: total_debt - total_paid,
            receipts: self.receipts,
        }
    }
}

/// Rounded per-customer figures as returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBalance {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_debt: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub receipts: u64,
}

fn accumulate(total: &mut Decimal, amount: Decimal, kind: EntryKind) {
    match total.checked_add(amount) {
        Some(sum) => *total = sum,
        None => {
            tracing::warn!(
                kind = %kind,
                amount = %amount,
                total = %total,
                "Ledger total out of range; amount ignored"
            );
        }
    }
}

/// Classification and summed magnitude of one row. Suspect rows are flagged.
pub(crate) fn classify_entry<E: LedgerEntry + ?Sized>(entry: &E) -> (Classification, Decimal) {
    let amount = entry.amount();
    let classification = entry.classification();
    if classification.is_suspect() {
        flag_fallback(entry.type_tag(), classification.kind);
    }
    (classification, magnitude(amount))
}

/// Fold one customer's rows.
pub fn aggregate<'a, E, I>(entries: I) -> CustomerStats
where
    E: LedgerEntry + 'a,
    I: IntoIterator<Item = &'a E>,
{
    entries
        .into_iter()
        .fold(CustomerStats::default(), |mut stats, entry| {
            stats.record(entry);
            stats
        })
}

/// Fold every row into per-customer stats. Rows without a usable customer
/// reference are skipped here; they still count in system totals.
pub fn stats_by_customer<'a, E, I>(entries: I) -> HashMap<CustomerKey, CustomerStats>
where
    E: LedgerEntry + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut groups: HashMap<CustomerKey, CustomerStats> = HashMap::new();
    for entry in entries {
        if let Some(key) = entry.customer_key() {
            groups.entry(key).or_default().record(entry);
        }
    }
    groups
}
