use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::cli::Invocation;
use crate::config::{Config, DashboardSettings};
use crate::datastore::DataStore;
use crate::datetime::{format_long_date, parse_day_expr};
use crate::entry::RevenueEntry;
use crate::grid::CalendarGrid;
use crate::index::DateIndex;
use crate::render::{Renderer, tooltip};
use crate::selection::{DayDetails, ViewState};
use crate::stats::Summary;

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "dashboard",
        "day",
        "peek",
        "stats",
        "export",
        "config",
        "commands",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Everything one render pass works from. Built once per invocation.
#[derive(Debug)]
pub struct Dashboard {
    pub settings: DashboardSettings,
    pub entries: Vec<RevenueEntry>,
    pub index: DateIndex,
    pub grid: CalendarGrid,
    pub summary: Summary,
}

impl Dashboard {
    #[instrument(skip(entries, settings))]
    pub fn build(
        entries: Vec<RevenueEntry>,
        settings: DashboardSettings,
        now: NaiveDateTime,
    ) -> anyhow::Result<Self> {
        let today = now.date();
        let year = settings.year.unwrap_or_else(|| today.year());

        let index = DateIndex::build(&entries);
        let grid = CalendarGrid::build(year, today, &index, &settings.thresholds)
            .with_context(|| format!("failed to lay out calendar for {year}"))?;
        let summary = Summary::compute(&entries, settings.objective, year, now)?;

        info!(
            year,
            entries = entries.len(),
            weeks = grid.week_count(),
            "dashboard ready"
        );

        Ok(Self {
            settings,
            entries,
            index,
            grid,
            summary,
        })
    }

    pub fn year(&self) -> i32 {
        self.grid.year
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    summary: &'a Summary,
    thresholds: &'a crate::level::Thresholds,
    grid: &'a CalendarGrid,
    selected: Option<DayDetails<'a>>,
}

#[instrument(skip(cfg, renderer, data_path, inv, now), fields(data = %data_path.display()))]
pub fn dispatch(
    cfg: &Config,
    renderer: &Renderer,
    data_path: &Path,
    inv: Invocation,
    now: NaiveDateTime,
) -> anyhow::Result<()> {
    let command = inv.command.as_str();

    debug!(command, args = ?inv.command_args, "dispatching command");

    match command {
        "config" => return cmd_config(cfg),
        "commands" => return cmd_commands(),
        "help" => return cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    if !known_command_names().contains(&command) {
        return Err(anyhow!("unknown command: {command}"));
    }

    let settings = DashboardSettings::from_config(cfg)?;
    let data_store = DataStore::open(data_path)?;
    let entries = data_store.load_entries()?;
    let dashboard = Dashboard::build(entries, settings, now)?;
    let mut view = ViewState::new();

    match command {
        "dashboard" => cmd_dashboard(&dashboard, &mut view, renderer),
        "day" => cmd_day(&dashboard, &mut view, renderer, &inv.command_args),
        "peek" => cmd_peek(&dashboard, &inv.command_args),
        "stats" => renderer.print_summary(&dashboard.summary, dashboard.grid.today),
        "export" => cmd_export(&dashboard, &mut view, &inv.command_args),
        other => Err(anyhow!("unknown command: {other}")),
    }
}

#[instrument(skip_all)]
fn cmd_dashboard(
    dashboard: &Dashboard,
    view: &mut ViewState,
    renderer: &Renderer,
) -> anyhow::Result<()> {
    info!("command dashboard");
    let selected = view.select_default(&dashboard.grid, &dashboard.index);
    renderer.print_dashboard(
        &dashboard.summary,
        &dashboard.grid,
        &dashboard.settings,
        selected.as_ref(),
    )
}

#[instrument(skip(dashboard, view, renderer))]
fn cmd_day(
    dashboard: &Dashboard,
    view: &mut ViewState,
    renderer: &Renderer,
    args: &[String],
) -> anyhow::Result<()> {
    info!("command day");
    let details = select_from_args(dashboard, view, args)?;
    renderer.print_day(&details, &dashboard.summary)
}

#[instrument(skip(dashboard))]
fn cmd_peek(dashboard: &Dashboard, args: &[String]) -> anyhow::Result<()> {
    info!("command peek");
    let mut out = io::stdout().lock();
    write_peek(&mut out, dashboard, args)
}

fn write_peek<W: Write>(out: &mut W, dashboard: &Dashboard, args: &[String]) -> anyhow::Result<()> {
    let date = resolve_day_arg(dashboard, args)?;
    let cell = dashboard
        .grid
        .cell(date)
        .ok_or_else(|| anyhow!("{date} is outside the {} calendar", dashboard.year()))?;

    match tooltip(cell) {
        Some(text) => writeln!(out, "{text}")?,
        None if cell.is_future => writeln!(out, "{}: not yet", format_long_date(date))?,
        None => return Err(anyhow!("{date} is not part of {}", dashboard.year())),
    }
    Ok(())
}

#[instrument(skip(dashboard, view))]
fn cmd_export(dashboard: &Dashboard, view: &mut ViewState, args: &[String]) -> anyhow::Result<()> {
    info!("command export");
    let mut out = io::stdout().lock();
    write_export(&mut out, dashboard, view, args)
}

fn write_export<W: Write>(
    out: &mut W,
    dashboard: &Dashboard,
    view: &mut ViewState,
    args: &[String],
) -> anyhow::Result<()> {
    let selected = if args.is_empty() {
        view.select_default(&dashboard.grid, &dashboard.index)
    } else {
        Some(select_from_args(dashboard, view, args)?)
    };

    let doc = ExportDocument {
        summary: &dashboard.summary,
        thresholds: &dashboard.settings.thresholds,
        grid: &dashboard.grid,
        selected,
    };
    serde_json::to_writer_pretty(&mut *out, &doc)?;
    writeln!(out)?;
    Ok(())
}

fn select_from_args<'a>(
    dashboard: &'a Dashboard,
    view: &mut ViewState,
    args: &[String],
) -> anyhow::Result<DayDetails<'a>> {
    let date = resolve_day_arg(dashboard, args)?;
    view.select(&dashboard.grid, &dashboard.index, date)
        .ok_or_else(|| {
            if date > dashboard.grid.today {
                anyhow!("{date} is in the future")
            } else {
                anyhow!("{date} is not part of {}", dashboard.year())
            }
        })
}

fn resolve_day_arg(dashboard: &Dashboard, args: &[String]) -> anyhow::Result<NaiveDate> {
    let expr = match args {
        [] => "today".to_string(),
        [single] => single.clone(),
        many => {
            warn!(args = ?many, "joining multiple day arguments");
            many.join(" ")
        }
    };
    parse_day_expr(&expr, dashboard.grid.today, dashboard.year())
}

fn cmd_config(cfg: &Config) -> anyhow::Result<()> {
    let mut pairs: Vec<_> = cfg.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    for (k, v) in pairs {
        println!("{k}={v}");
    }
    for file in &cfg.loaded_files {
        println!("# loaded {}", file.display());
    }
    Ok(())
}

fn cmd_commands() -> anyhow::Result<()> {
    for name in known_command_names() {
        println!("{name}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("revboard [options] [command] [args]");
    println!();
    println!("  dashboard          heatmap, goal progress and yesterday's breakdown (default)");
    println!("  day <when>         details for one day: today, yesterday, -3d, 2026-01-05, 42");
    println!("  peek <when>        one-line summary of a day");
    println!("  stats              revenue, objective and year progress");
    println!("  export [when]      grid and stats as JSON");
    println!("  config             resolved configuration");
    println!("  commands           list command names");
    println!("  version            print version");
    println!();
    println!("options: -v/-q, --data <file>, --rcfile <file>, --rc key=value, --now <date>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{
        Dashboard, expand_command_abbrev, known_command_names, resolve_day_arg, write_export,
        write_peek,
    };
    use crate::config::{Config, DashboardSettings};
    use crate::entry::RevenueEntry;
    use crate::selection::ViewState;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .and_then(|date| date.and_hms_opt(18, 30, 0))
            .expect("valid now")
    }

    #[test]
    fn abbreviations_must_be_unique() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("dash", &known), Some("dashboard"));
        assert_eq!(expand_command_abbrev("pe", &known), Some("peek"));
        assert_eq!(expand_command_abbrev("d", &known), None);
        assert_eq!(expand_command_abbrev("co", &known), None);
        assert_eq!(expand_command_abbrev("zzz", &known), None);
    }

    #[test]
    fn dashboard_defaults_year_to_now_and_honors_override() {
        let settings = DashboardSettings::from_config(&Config::default()).expect("settings");
        let entries = vec![RevenueEntry::new(
            5,
            NaiveDate::from_ymd_opt(2026, 1, 5).expect("date"),
            100.0,
        )];

        let dashboard = Dashboard::build(entries.clone(), settings.clone(), now()).expect("build");
        assert_eq!(dashboard.year(), 2026);
        assert_eq!(format!("{:.1}", dashboard.summary.progress_percent), "1.0");

        let mut cfg = Config::default();
        cfg.apply_overrides([("year".to_string(), "2025".to_string())]);
        let settings = DashboardSettings::from_config(&cfg).expect("settings");
        let past = Dashboard::build(entries, settings, now()).expect("build");
        assert_eq!(past.year(), 2025);
        assert_eq!(past.summary.year_percent, 100.0);
        assert!(past.grid.cells().all(|cell| !cell.is_future));
    }

    #[test]
    fn day_arguments_resolve_against_today() {
        let settings = DashboardSettings::from_config(&Config::default()).expect("settings");
        let dashboard = Dashboard::build(vec![], settings, now()).expect("build");

        let today = resolve_day_arg(&dashboard, &[]).expect("default");
        assert_eq!(today.to_string(), "2026-03-10");
        let yesterday = resolve_day_arg(&dashboard, &["yesterday".to_string()]).expect("yesterday");
        assert_eq!(yesterday.to_string(), "2026-03-09");
    }

    fn january_dashboard() -> Dashboard {
        let day = |d: u32| NaiveDate::from_ymd_opt(2026, 1, d).expect("date");
        let entries = vec![
            RevenueEntry::new(4, day(4), 320.0)
                .with_source("my-app", "My App", Some("https://example.com/app"), 300.0)
                .with_source("my-ebook", "My Ebook", None, 20.0),
            RevenueEntry::new(5, day(5), 100.0),
        ];
        let settings = DashboardSettings::from_config(&Config::default()).expect("settings");
        let now = day(6).and_hms_opt(9, 0, 0).expect("now");
        Dashboard::build(entries, settings, now).expect("build")
    }

    fn peek(dashboard: &Dashboard, expr: &str) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        write_peek(&mut buf, dashboard, &[expr.to_string()])?;
        Ok(String::from_utf8(buf).expect("utf8"))
    }

    fn export(dashboard: &Dashboard, args: &[&str]) -> serde_json::Value {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        let mut buf = Vec::new();
        write_export(&mut buf, dashboard, &mut ViewState::new(), &args).expect("export");
        serde_json::from_slice(&buf).expect("export is json")
    }

    #[test]
    fn peek_describes_past_and_future_days() {
        let dashboard = january_dashboard();

        assert_eq!(
            peek(&dashboard, "2026-01-04").expect("past day"),
            "Sunday, January 4, 2026: $320 revenue\n"
        );
        assert_eq!(
            peek(&dashboard, "2026-01-10").expect("future day"),
            "Saturday, January 10, 2026: not yet\n"
        );
    }

    #[test]
    fn peek_rejects_placeholder_and_outside_days() {
        let dashboard = january_dashboard();

        let err = peek(&dashboard, "2025-12-31").expect_err("leading placeholder");
        assert!(format!("{err:#}").contains("not part of 2026"));

        let err = peek(&dashboard, "2025-06-01").expect_err("outside grid");
        assert!(format!("{err:#}").contains("outside the 2026 calendar"));
    }

    #[test]
    fn export_carries_requested_or_default_selection() {
        let dashboard = january_dashboard();

        let json = export(&dashboard, &["2026-01-04"]);
        assert_eq!(json["selected"]["date"], "2026-01-04");
        assert_eq!(json["selected"]["dayOfYear"], 4);
        assert_eq!(json["selected"]["entry"]["totalRevenue"], 320.0);
        assert_eq!(
            json["selected"]["entry"]["revenueComposition"][0]["url"],
            "https://example.com/app"
        );
        assert_eq!(json["thresholds"]["level4"], 600.0);
        assert_eq!(json["summary"]["totalRevenue"], 420.0);

        let json = export(&dashboard, &[]);
        assert_eq!(json["selected"]["date"], "2026-01-05");

        let mut buf = Vec::new();
        let err = write_export(
            &mut buf,
            &dashboard,
            &mut ViewState::new(),
            &["2026-01-20".to_string()],
        )
        .expect_err("future selection");
        assert!(format!("{err:#}").contains("in the future"));
    }
}
