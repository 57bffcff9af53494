use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::config::{Config, DashboardSettings};
use crate::datetime::{format_long_date, format_short_date};
use crate::grid::{CalendarGrid, GridCell};
use crate::level::{Level, Thresholds};
use crate::selection::DayDetails;
use crate::stats::Summary;

const BAR_WIDTH: usize = 40;
const ROW_LABEL_WIDTH: usize = 4;
const ROW_LABELS: [&str; 7] = ["", "Mon", "", "Wed", "", "Fri", ""];
const LEVEL_COLORS: [u8; 5] = [238, 22, 28, 34, 40];
const LEVEL_GLYPHS: [&str; 5] = ["□", "░", "▒", "▓", "█"];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    /// Renderer without ANSI escapes, used for pipes and tests.
    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_dashboard(
        &self,
        summary: &Summary,
        grid: &CalendarGrid,
        settings: &DashboardSettings,
        selected: Option<&DayDetails<'_>>,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_dashboard(&mut out, summary, grid, settings, selected)
    }

    #[tracing::instrument(skip_all)]
    pub fn print_summary(&self, summary: &Summary, as_of: NaiveDate) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_summary(&mut out, summary)?;
        writeln!(out, "as of {}", format_short_date(as_of))?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn print_day(&self, details: &DayDetails<'_>, summary: &Summary) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_day(&mut out, details, summary)
    }

    pub fn write_dashboard<W: Write>(
        &self,
        out: &mut W,
        summary: &Summary,
        grid: &CalendarGrid,
        settings: &DashboardSettings,
        selected: Option<&DayDetails<'_>>,
    ) -> anyhow::Result<()> {
        self.write_summary(out, summary)?;
        writeln!(out)?;
        self.write_grid(out, grid, selected.map(|details| details.date))?;
        self.write_legend(out, &settings.thresholds)?;

        if let Some(details) = selected {
            writeln!(out)?;
            self.write_day(out, details, summary)?;
        }

        if let Some(handle) = settings.handle.as_deref() {
            writeln!(out)?;
            writeln!(out, "@{handle}  {}", profile_url(handle))?;
        }
        Ok(())
    }

    pub fn write_summary<W: Write>(&self, out: &mut W, summary: &Summary) -> anyhow::Result<()> {
        writeln!(
            out,
            "Revenue {}  Objective {}  Progress {}  Year {:.1}%",
            self.paint(&format_currency(summary.total_revenue), "1"),
            format_currency(summary.objective),
            self.paint(&format!("{:.1}%", summary.progress_percent), "32"),
            summary.year_percent,
        )?;
        writeln!(out, "{}", self.progress_bar(summary))?;
        Ok(())
    }

    /// Fill tracks clamped progress; `|` marks how much of the year has passed.
    fn progress_bar(&self, summary: &Summary) -> String {
        let filled = scale_to_width(summary.progress_fill(), BAR_WIDTH);
        let marker = scale_to_width(summary.year_percent, BAR_WIDTH - 1);

        let mut bar = String::with_capacity(BAR_WIDTH * 3 + 2);
        bar.push('[');
        for idx in 0..BAR_WIDTH {
            if idx == marker {
                bar.push_str(&self.paint("|", "33"));
            } else if idx < filled {
                bar.push_str(&self.paint("█", "32"));
            } else {
                bar.push('░');
            }
        }
        bar.push(']');
        bar
    }

    pub fn write_grid<W: Write>(
        &self,
        out: &mut W,
        grid: &CalendarGrid,
        selected: Option<NaiveDate>,
    ) -> anyhow::Result<()> {
        let mut labels = " ".repeat(ROW_LABEL_WIDTH);
        for segment in &grid.months {
            let width = segment.width_in_weeks * 2;
            let label: String = segment.label().chars().take(width).collect();
            labels.push_str(&format!("{label:<width$}"));
        }
        writeln!(out, "{}", labels.trim_end())?;

        for (row, row_label) in ROW_LABELS.iter().enumerate() {
            let mut line = format!("{row_label:<width$}", width = ROW_LABEL_WIDTH);
            for week in &grid.weeks {
                let cell = &week.days[row];
                line.push_str(&self.cell_glyph(cell, selected == Some(cell.date)));
                line.push(' ');
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }

    fn cell_glyph(&self, cell: &GridCell, selected: bool) -> String {
        if !cell.in_current_year {
            return " ".to_string();
        }
        if cell.is_future {
            return self.paint("·", "2");
        }

        let level = usize::from(cell.level.value()).min(LEVEL_GLYPHS.len() - 1);
        if self.color {
            let code = format!("38;5;{}", LEVEL_COLORS[level]);
            if selected {
                self.paint("■", &format!("7;{code}"))
            } else {
                self.paint("■", &code)
            }
        } else if selected {
            "◆".to_string()
        } else {
            LEVEL_GLYPHS[level].to_string()
        }
    }

    pub fn write_legend<W: Write>(&self, out: &mut W, thresholds: &Thresholds) -> anyhow::Result<()> {
        let swatches = Level::all()
            .iter()
            .map(|level| self.level_swatch(*level))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(
            out,
            "{}Less {} More   (1: <{}  2: <{}  3: <{}  4: {}+)",
            " ".repeat(ROW_LABEL_WIDTH),
            swatches,
            format_currency(thresholds.level1),
            format_currency(thresholds.level2),
            format_currency(thresholds.level3),
            format_currency(thresholds.level3),
        )?;
        Ok(())
    }

    fn level_swatch(&self, level: Level) -> String {
        let idx = usize::from(level.value()).min(LEVEL_GLYPHS.len() - 1);
        if self.color {
            self.paint("■", &format!("38;5;{}", LEVEL_COLORS[idx]))
        } else {
            LEVEL_GLYPHS[idx].to_string()
        }
    }

    pub fn write_day<W: Write>(
        &self,
        out: &mut W,
        details: &DayDetails<'_>,
        summary: &Summary,
    ) -> anyhow::Result<()> {
        writeln!(
            out,
            "{}  {}",
            self.paint(&format!("Day {}", details.day_of_year), "33"),
            format_long_date(details.date)
        )?;
        writeln!(out, "{}", self.paint(&format_currency(details.revenue()), "1"))?;
        writeln!(out, "{}", goal_line(summary))?;

        let Some(entry) = details.entry.filter(|_| details.has_revenue()) else {
            writeln!(out, "No revenue recorded for this day")?;
            return Ok(());
        };

        writeln!(out)?;
        writeln!(out, "Breakdown")?;
        let headers = vec!["Source".to_string(), "Revenue".to_string(), "Link".to_string()];
        let rows = entry
            .composition
            .iter()
            .map(|source| {
                vec![
                    source.name.clone(),
                    format_currency(source.revenue),
                    source.url.clone().unwrap_or_default(),
                ]
            })
            .collect();
        write_table(out, headers, rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Hover text for one interactive cell.
pub fn tooltip(cell: &GridCell) -> Option<String> {
    let amount = cell.revenue_amount.filter(|_| cell.is_interactive())?;
    Some(format!(
        "{}: {} revenue",
        format_long_date(cell.date),
        format_currency(amount)
    ))
}

pub fn goal_line(summary: &Summary) -> String {
    format!(
        "{:.1}% of yearly goal ({})",
        summary.progress_percent,
        format_currency(summary.objective)
    )
}

pub fn profile_url(handle: &str) -> String {
    format!("https://x.com/{handle}")
}

/// en-US dollars with no fraction digits, e.g. `$1,235`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn scale_to_width(percent: f64, width: usize) -> usize {
    let clamped = percent.clamp(0.0, 100.0);
    ((clamped / 100.0) * width as f64).round() as usize
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let mut line = String::new();
    for idx in 0..column_count {
        line.push_str(&format!("{:width$} ", headers[idx], width = widths[idx]));
    }
    writeln!(writer, "{}", line.trim_end())?;

    line.clear();
    for &width in &widths {
        line.push_str(&format!("{:-<width$} ", "", width = width));
    }
    writeln!(writer, "{}", line.trim_end())?;

    for row in rows {
        line.clear();
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            line.push_str(&format!("{}{} ", cell, " ".repeat(padding)));
        }
        writeln!(writer, "{}", line.trim_end())?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
