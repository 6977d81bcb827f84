use super::LedgerEntry;
use chrono::{DateTime, Utc};

/// Sort rows newest first by logical date, then by creation time.
///
/// Rows with no date at all sink to the end. The sort is stable, so exact
/// ties keep the store's order.
pub fn newest_first<E: LedgerEntry>(entries: &mut [E]) {
    entries.sort_by(|a, b| display_key(b).cmp(&display_key(a)));
}

fn display_key<E: LedgerEntry>(entry: &E) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    (entry.effective_date(), entry.created_at())
}
