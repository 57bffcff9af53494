use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::debug;

use crate::datetime::{first_day_of_year, last_day_of_year};
use crate::entry::RevenueEntry;

/// Header figures for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_revenue: f64,
    pub objective: f64,
    /// Unclamped; may exceed 100.
    pub progress_percent: f64,
    pub year_percent: f64,
}

impl Summary {
    #[tracing::instrument(skip(entries))]
    pub fn compute(
        entries: &[RevenueEntry],
        objective: f64,
        year: i32,
        now: NaiveDateTime,
    ) -> anyhow::Result<Self> {
        let total_revenue = total_revenue(entries);
        let summary = Self {
            total_revenue,
            objective,
            progress_percent: progress_percent(total_revenue, objective),
            year_percent: year_progress(year, now)?,
        };
        debug!(?summary, "computed summary");
        Ok(summary)
    }

    /// Fill for bounded indicators such as the progress bar.
    pub fn progress_fill(&self) -> f64 {
        self.progress_percent.clamp(0.0, 100.0)
    }
}

pub fn total_revenue(entries: &[RevenueEntry]) -> f64 {
    entries.iter().map(|entry| entry.total_revenue).sum()
}

/// `total / objective * 100`; a non-positive objective reports 0.
pub fn progress_percent(total: f64, objective: f64) -> f64 {
    if objective <= 0.0 {
        return 0.0;
    }
    total / objective * 100.0
}

/// Position of `now` between Jan 1 00:00:00 and Dec 31 23:59:59, in percent.
pub fn year_progress(year: i32, now: NaiveDateTime) -> anyhow::Result<f64> {
    let start = first_day_of_year(year)?.and_time(NaiveTime::MIN);
    let end = last_day_of_year(year)?
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| anyhow::anyhow!("failed to construct end of year {year}"))?;

    if now < start {
        return Ok(0.0);
    }
    if now > end {
        return Ok(100.0);
    }

    let total = (end - start).num_milliseconds() as f64;
    let passed = (now - start).num_milliseconds() as f64;
    Ok(passed / total * 100.0)
}

/// 1-based day of the year.
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{Summary, day_of_year, progress_percent, total_revenue, year_progress};
    use crate::entry::RevenueEntry;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").expect("valid instant")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn year_progress_interpolates_and_clamps() {
        let mid = year_progress(2026, at("2026-07-02T12:00:00")).expect("mid year");
        assert!((mid - 50.0).abs() < 0.01, "got {mid}");

        assert_eq!(year_progress(2026, at("2025-12-31T23:00:00")).expect("before"), 0.0);
        assert_eq!(year_progress(2026, at("2027-01-01T00:00:00")).expect("after"), 100.0);
        assert_eq!(year_progress(2026, at("2026-01-01T00:00:00")).expect("start"), 0.0);
        assert_eq!(year_progress(2026, at("2026-12-31T23:59:59")).expect("end"), 100.0);
    }

    #[test]
    fn progress_against_objective() {
        let entries = vec![RevenueEntry::new(5, date(2026, 1, 5), 100.0)];
        let summary =
            Summary::compute(&entries, 10_000.0, 2026, at("2026-01-06T09:00:00")).expect("summary");

        assert_eq!(format!("{:.1}", summary.progress_percent), "1.0");
        assert_eq!(summary.progress_fill(), 1.0);

        assert_eq!(progress_percent(25_000.0, 10_000.0), 250.0);
        let over = Summary {
            total_revenue: 25_000.0,
            objective: 10_000.0,
            progress_percent: 250.0,
            year_percent: 10.0,
        };
        assert_eq!(over.progress_fill(), 100.0);
        assert_eq!(progress_percent(10.0, 0.0), 0.0);
    }

    #[test]
    fn total_is_order_independent() {
        let amounts = [71.14, 0.1, 0.2, 1234.56, 9.99, 300.0, 0.01];
        let forward: Vec<RevenueEntry> = amounts
            .iter()
            .enumerate()
            .map(|(idx, amount)| {
                let day = idx as u32 + 1;
                RevenueEntry::new(day, date(2026, 1, day), *amount)
            })
            .collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        assert!((total_revenue(&forward) - total_revenue(&reversed)).abs() < 1e-9);
        assert!((total_revenue(&forward) - 1616.0).abs() < 1e-9);
    }

    #[test]
    fn day_numbers_are_one_based() {
        assert_eq!(day_of_year(date(2026, 1, 1)), 1);
        assert_eq!(day_of_year(date(2026, 12, 31)), 365);
        assert_eq!(day_of_year(date(2028, 12, 31)), 366);
    }
}
