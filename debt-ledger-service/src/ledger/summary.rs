use super::aggregate::{classify_entry, CustomerStats};
use super::amount::round_money;
use super::{CustomerKey, LedgerEntry};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Dashboard totals across all customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSummary {
    pub total_customers: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_debt: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_outstanding_debt: Decimal,
    pub total_debtors: u64,
}

impl SystemSummary {
    /// Build from system-wide sums and the per-customer groups.
    ///
    /// A debtor is any group whose unrounded balance is positive. Groups are
    /// keyed by the transactions' customer reference, so rows left behind by a
    /// deleted customer still form a group.
    pub fn from_parts<I>(total_customers: u64, overall: &CustomerStats, groups: I) -> Self
    where
        I: IntoIterator<Item = CustomerStats>,
    {
        let total_debt = round_money(overall.total_debt);
        let total_paid = round_money(overall.total_paid);
        let total_debtors = groups.into_iter().filter(|g| g.is_debtor()).count() as u64;

        Self {
            total_customers,
            total_debt,
            total_paid,
            total_outstanding_debt: total_debt - total_paid,
            total_debtors,
        }
    }
}

/// Single pass over every row: system sums include unkeyed rows, the debtor
/// count only the keyed ones.
pub fn summarize<'a, E, I>(total_customers: u64, entries: I) -> SystemSummary
where
    E: LedgerEntry + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut overall = CustomerStats::default();
    let mut groups: HashMap<CustomerKey, CustomerStats> = HashMap::new();

    for entry in entries {
        let (classification, amount) = classify_entry(entry);
        overall.add(classification.kind, amount);
        if let Some(key) = entry.customer_key() {
            groups
                .entry(key)
                .or_default()
                .add(classification.kind, amount);
        }
    }

    SystemSummary::from_parts(total_customers, &overall, groups.into_values())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testing::{dec, row, Row};

    #[test]
    fn counts_only_positive_balances_as_debtors() {
        let rows = vec![
            // +30
            row("a", Some("debit"), "50"),
            row("a", Some("credit"), "20"),
            // -20
            row("b", Some("credit"), "20"),
            // 0
            row("c", Some("debit"), "10"),
            row("c", Some("credit"), "10"),
        ];
        let summary = summarize(3, &rows);

        assert_eq!(summary.total_customers, 3);
        assert_eq!(summary.total_debtors, 1);
        assert_eq!(summary.total_debt, dec("60"));
        assert_eq!(summary.total_paid, dec("50"));
        assert_eq!(summary.total_outstanding_debt, dec("10"));
    }

    #[test]
    fn unkeyed_rows_count_in_totals_only() {
        let rows = vec![Row {
            customer: None,
            tag: Some("debit"),
            amount: Some(dec("40")),
            ..Row::default()
        }];
        let summary = summarize(0, &rows);

        assert_eq!(summary.total_debt, dec("40"));
        assert_eq!(summary.total_debtors, 0);
    }

    #[test]
    fn orphaned_groups_still_count() {
        let rows = vec![row("deleted-customer", Some("DEBT"), "5")];
        let summary = summarize(0, &rows);
        assert_eq!(summary.total_debtors, 1);
    }

    #[test]
    fn totals_match_per_customer_sums() {
        let rows = vec![
            row("a", Some("debit"), "12.34"),
            row("b", None, "-1.01"),
            row("b", Some("payment"), "0.5"),
        ];
        let summary = summarize(2, &rows);
        let groups = crate::ledger::stats_by_customer(&rows);

        let debt: Decimal = groups.values().map(|g| g.total_debt).sum();
        let paid: Decimal = groups.values().map(|g| g.total_paid).sum();
        assert_eq!(summary.total_debt, round_money(debt));
        assert_eq!(summary.total_paid, round_money(paid));
    }

    #[test]
    fn out_of_range_legacy_amounts_do_not_abort_the_summary() {
        let huge = crate::ledger::amount_from_bson(&mongodb::bson::Bson::Double(5e28)).unwrap();
        let big = Row {
            customer: Some("a"),
            tag: Some("debit"),
            amount: Some(huge),
            ..Row::default()
        };
        let rows = vec![big.clone(), big, row("b", Some("credit"), "10")];
        let summary = summarize(2, &rows);

        assert_eq!(summary.total_debt, round_money(huge));
        assert_eq!(summary.total_paid, dec("10"));
        assert_eq!(summary.total_debtors, 1);
    }

    #[test]
    fn empty_ledger() {
        let rows: Vec<Row> = Vec::new();
        let summary = summarize(0, &rows);
        assert_eq!(summary.total_debt, Decimal::ZERO);
        assert_eq!(summary.total_outstanding_debt, Decimal::ZERO);
        assert_eq!(summary.total_debtors, 0);
    }
}
