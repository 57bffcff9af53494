use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::entry::RevenueEntry;

/// Read-only date lookup over the loaded entries. Absent dates mean zero revenue.
#[derive(Debug, Clone, Default)]
pub struct DateIndex {
    by_date: HashMap<NaiveDate, RevenueEntry>,
}

impl DateIndex {
    #[tracing::instrument(skip(entries))]
    pub fn build(entries: &[RevenueEntry]) -> Self {
        let mut by_date = HashMap::with_capacity(entries.len());
        for entry in entries {
            // last write wins
            if by_date.insert(entry.date, entry.clone()).is_some() {
                debug!(date = %entry.date, "duplicate entry date replaced earlier record");
            }
        }
        debug!(days = by_date.len(), "built date index");
        Self { by_date }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&RevenueEntry> {
        self.by_date.get(&date)
    }

    /// Lookup by `YYYY-MM-DD`; anything unparseable is simply "no data".
    pub fn get_str(&self, date: &str) -> Option<&RevenueEntry> {
        NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|date| self.get(date))
    }

    pub fn revenue_on(&self, date: NaiveDate) -> f64 {
        self.get(date).map(|entry| entry.total_revenue).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}
