use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::datetime::add_days;
use crate::entry::RevenueEntry;
use crate::grid::CalendarGrid;
use crate::index::DateIndex;
use crate::stats::day_of_year;

/// What the detail panel shows for one selected day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayDetails<'a> {
    pub date: NaiveDate,
    pub day_of_year: u32,
    pub entry: Option<&'a RevenueEntry>,
}

impl DayDetails<'_> {
    pub fn revenue(&self) -> f64 {
        self.entry.map(|entry| entry.total_revenue).unwrap_or(0.0)
    }

    /// Days with no record, or a record of zero, show the empty breakdown.
    pub fn has_revenue(&self) -> bool {
        self.entry.is_some_and(RevenueEntry::has_revenue)
    }
}

/// The single "currently selected day" owned by whoever drives the view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    selected: Option<NaiveDate>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    /// Selects `date` if the grid shows it as interactive; otherwise the
    /// previous selection is kept and `None` is returned.
    #[instrument(skip(self, grid, index))]
    pub fn select<'a>(
        &mut self,
        grid: &CalendarGrid,
        index: &'a DateIndex,
        date: NaiveDate,
    ) -> Option<DayDetails<'a>> {
        let interactive = grid.cell(date).is_some_and(|cell| cell.is_interactive());
        if !interactive {
            debug!(%date, "date is not selectable");
            return None;
        }

        self.selected = Some(date);
        Some(DayDetails {
            date,
            day_of_year: day_of_year(date),
            entry: index.get(date),
        })
    }

    /// Details for the current selection, if any.
    pub fn details<'a>(&self, index: &'a DateIndex) -> Option<DayDetails<'a>> {
        self.selected.map(|date| DayDetails {
            date,
            day_of_year: day_of_year(date),
            entry: index.get(date),
        })
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Opens the view on yesterday when it is in the grid's year and earned something.
    #[instrument(skip(self, grid, index))]
    pub fn select_default<'a>(
        &mut self,
        grid: &CalendarGrid,
        index: &'a DateIndex,
    ) -> Option<DayDetails<'a>> {
        let yesterday = add_days(grid.today, -1).ok()?;
        let earned = index.get(yesterday).is_some_and(RevenueEntry::has_revenue);
        if !earned {
            debug!(%yesterday, "no revenue yesterday; nothing selected by default");
            return None;
        }
        self.select(grid, index, yesterday)
    }
}
