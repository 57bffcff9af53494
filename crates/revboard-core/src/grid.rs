//! Week-aligned calendar heatmap layout.
//!
//! The grid runs from the Sunday on or before January 1 to the Saturday on or
//! after December 31, so every column holds exactly seven days. Days from the
//! neighbouring years stay in the grid as placeholders to keep the columns
//! aligned.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::datetime::{add_days, first_day_of_year, is_in_year, last_day_of_year, month_abbrev};
use crate::index::DateIndex;
use crate::level::{Level, Thresholds};

pub const DAYS_PER_WEEK: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub date: NaiveDate,
    pub in_current_year: bool,
    pub is_future: bool,
    pub level: Level,
    /// `None` for placeholders and future days.
    pub revenue_amount: Option<f64>,
}

impl GridCell {
    /// Only past or present days of the target year respond to hover/select.
    pub fn is_interactive(&self) -> bool {
        self.in_current_year && !self.is_future
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekColumn {
    pub index: usize,
    pub days: [GridCell; DAYS_PER_WEEK],
}

impl WeekColumn {
    fn first_in_year(&self) -> Option<&GridCell> {
        self.days.iter().find(|cell| cell.in_current_year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthLabelSegment {
    /// Zero-based month (0 = January).
    pub month_index: u32,
    pub start_week_column: usize,
    pub width_in_weeks: usize,
}

impl MonthLabelSegment {
    pub fn label(&self) -> &'static str {
        month_abbrev(self.month_index + 1)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarGrid {
    pub year: i32,
    pub today: NaiveDate,
    pub weeks: Vec<WeekColumn>,
    pub months: Vec<MonthLabelSegment>,
}

impl CalendarGrid {
    /// Lays out the whole year. Never fails for years chrono can represent.
    #[instrument(skip(index, thresholds))]
    pub fn build(
        year: i32,
        today: NaiveDate,
        index: &DateIndex,
        thresholds: &Thresholds,
    ) -> anyhow::Result<Self> {
        let first = first_day_of_year(year)?;
        let last = last_day_of_year(year)?;

        let start = add_days(first, -i64::from(first.weekday().num_days_from_sunday()))?;
        let end = add_days(last, i64::from(6 - last.weekday().num_days_from_sunday()))?;
        let week_count = ((end - start).num_days() as usize + 1) / DAYS_PER_WEEK;

        let mut weeks = Vec::with_capacity(week_count);
        let mut current = start;
        for week_idx in 0..week_count {
            let mut days = Vec::with_capacity(DAYS_PER_WEEK);
            for _ in 0..DAYS_PER_WEEK {
                days.push(layout_cell(current, year, today, index, thresholds));
                current = add_days(current, 1)?;
            }
            let days: [GridCell; DAYS_PER_WEEK] = days
                .try_into()
                .map_err(|_| anyhow::anyhow!("week column {week_idx} is not seven days"))?;
            weeks.push(WeekColumn {
                index: week_idx,
                days,
            });
        }

        let months = month_segments(&weeks);

        debug!(
            year,
            %start,
            %end,
            weeks = weeks.len(),
            months = months.len(),
            "built calendar grid"
        );

        Ok(Self {
            year,
            today,
            weeks,
            months,
        })
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.weeks.iter().flat_map(|week| week.days.iter())
    }

    pub fn cell(&self, date: NaiveDate) -> Option<&GridCell> {
        let start = self.weeks.first()?.days[0].date;
        let offset = usize::try_from((date - start).num_days()).ok()?;
        self.weeks
            .get(offset / DAYS_PER_WEEK)
            .map(|week| &week.days[offset % DAYS_PER_WEEK])
    }

    /// Row `0` is Sunday.
    pub fn row(&self, weekday: Weekday) -> impl Iterator<Item = &GridCell> {
        let row = weekday.num_days_from_sunday() as usize;
        self.weeks.iter().map(move |week| &week.days[row])
    }
}

fn layout_cell(
    date: NaiveDate,
    year: i32,
    today: NaiveDate,
    index: &DateIndex,
    thresholds: &Thresholds,
) -> GridCell {
    if !is_in_year(date, year) {
        return GridCell {
            date,
            in_current_year: false,
            is_future: false,
            level: Level::NONE,
            revenue_amount: None,
        };
    }

    if date > today {
        return GridCell {
            date,
            in_current_year: true,
            is_future: true,
            level: Level::NONE,
            revenue_amount: None,
        };
    }

    let amount = index.revenue_on(date);
    GridCell {
        date,
        in_current_year: true,
        is_future: false,
        level: thresholds.classify(amount),
        revenue_amount: Some(amount),
    }
}

/// A column opens a segment when its first in-year day is in a month other
/// than the last one recorded. After the first column that day is always the
/// Sunday, so labels sit over the week where a month's first Sunday falls.
fn month_segments(weeks: &[WeekColumn]) -> Vec<MonthLabelSegment> {
    let mut starts: Vec<(u32, usize)> = Vec::new();
    let mut last_month: Option<u32> = None;

    for week in weeks {
        let Some(cell) = week.first_in_year() else {
            continue;
        };
        let month = cell.date.month0();
        if last_month != Some(month) {
            starts.push((month, week.index));
            last_month = Some(month);
        }
    }

    let total = weeks.len();
    starts
        .iter()
        .enumerate()
        .map(|(idx, &(month_index, start))| {
            let end = starts.get(idx + 1).map(|&(_, next)| next).unwrap_or(total);
            MonthLabelSegment {
                month_index,
                start_week_column: start,
                width_in_weeks: end - start,
            }
        })
        .collect()
}
