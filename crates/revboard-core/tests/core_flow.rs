use std::ffi::OsString;
use std::fs;

use chrono::{Datelike, NaiveDate, Weekday};
use revboard_core::commands::Dashboard;
use revboard_core::config::{Config, DashboardSettings};
use revboard_core::datastore::DataStore;
use revboard_core::render::Renderer;
use revboard_core::selection::ViewState;
use tempfile::tempdir;

const SAMPLE: &str = r#"[
  {
    "day": 1,
    "date": "2026-01-01",
    "totalRevenue": 71.14,
    "revenueComposition": [
      { "id": "my-apps", "name": "My Apps", "url": "", "revenue": 71.14 }
    ]
  },
  {
    "day": 4,
    "date": "2026-01-04",
    "totalRevenue": 320,
    "revenueComposition": [
      { "id": "my-app", "name": "My App", "url": "https://example.com/app", "revenue": 300 },
      { "id": "my-ebook", "name": "My Ebook", "url": "", "revenue": 20 }
    ]
  },
  {
    "day": 5,
    "date": "2026-01-05",
    "totalRevenue": 100,
    "revenueComposition": [
      { "id": "my-app", "name": "My App", "revenue": 100 }
    ]
  }
]"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn data_file_to_rendered_dashboard() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("revenue.json");
    fs::write(&path, SAMPLE).expect("write sample");

    let entries = DataStore::open(&path)
        .expect("open datastore")
        .load_entries()
        .expect("load entries");
    assert_eq!(entries.len(), 3);

    let settings = DashboardSettings::from_config(&Config::default()).expect("settings");
    let now = date(2026, 1, 5).and_hms_opt(9, 0, 0).expect("now");
    let dashboard = Dashboard::build(entries, settings, now).expect("dashboard");

    let cells: Vec<_> = dashboard.grid.cells().collect();
    assert_eq!(cells.len(), dashboard.grid.week_count() * 7);
    assert_eq!(cells[0].date.weekday(), Weekday::Sun);
    assert_eq!(
        cells.iter().filter(|cell| cell.in_current_year).count(),
        365
    );
    assert_eq!(
        dashboard
            .grid
            .months
            .iter()
            .map(|segment| segment.width_in_weeks)
            .sum::<usize>(),
        dashboard.grid.week_count()
    );

    let levels: Vec<u8> = (1..=6)
        .map(|day| {
            dashboard
                .grid
                .cell(date(2026, 1, day))
                .map(|cell| cell.level.value())
                .expect("cell in grid")
        })
        .collect();
    assert_eq!(levels, vec![2, 0, 0, 4, 2, 0]);
    assert!(dashboard.grid.cell(date(2026, 1, 6)).is_some_and(|cell| cell.is_future));

    let total = dashboard.summary.total_revenue;
    assert!((total - 491.14).abs() < 1e-9);
    assert_eq!(format!("{:.1}", dashboard.summary.progress_percent), "4.9");

    let mut view = ViewState::new();
    let details = view
        .select(&dashboard.grid, &dashboard.index, date(2026, 1, 4))
        .expect("selectable");

    let mut buf = Vec::new();
    Renderer::plain()
        .write_dashboard(
            &mut buf,
            &dashboard.summary,
            &dashboard.grid,
            &dashboard.settings,
            Some(&details),
        )
        .expect("render");
    let text = String::from_utf8(buf).expect("utf8");

    assert!(text.contains("Revenue $491  Objective $10,000  Progress 4.9%"));
    assert!(text.contains("Day 4  Sunday, January 4, 2026"));
    assert!(text.contains("$320"));
    assert!(text.contains("https://example.com/app"));
    assert!(text.contains("My Ebook"));
}

#[test]
fn grid_exports_as_declarative_json() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("revenue.jsonl");
    fs::write(
        &path,
        "{\"day\": 1, \"date\": \"2026-01-01\", \"totalRevenue\": 650}\n",
    )
    .expect("write jsonl");

    let entries = DataStore::open(&path)
        .expect("open")
        .load_entries()
        .expect("load");
    let settings = DashboardSettings::from_config(&Config::default()).expect("settings");
    let now = date(2026, 1, 1).and_hms_opt(23, 0, 0).expect("now");
    let dashboard = Dashboard::build(entries, settings, now).expect("dashboard");

    let json = serde_json::to_value(&dashboard.grid).expect("serialize grid");
    let weeks = json["weeks"].as_array().expect("weeks array");
    assert_eq!(weeks.len(), dashboard.grid.week_count());

    // 2026-01-01 is the Thursday of the first column.
    let jan_first = &weeks[0]["days"][4];
    assert_eq!(jan_first["date"], "2026-01-01");
    assert_eq!(jan_first["level"], 4);
    assert_eq!(jan_first["revenueAmount"], 650.0);
    assert_eq!(weeks[0]["days"][0]["inCurrentYear"], false);
    assert_eq!(weeks[0]["days"][5]["isFuture"], true);
    assert_eq!(json["months"][0]["monthIndex"], 0);
}

#[test]
fn cli_run_reads_rcfile_and_data() {
    let temp = tempdir().expect("tempdir");
    let data = temp.path().join("revenue.json");
    fs::write(&data, SAMPLE).expect("write sample");
    let rc = temp.path().join("revboardrc");
    fs::write(&rc, "objective = 5000\ncolor = off\nhandle = maker\n").expect("write rc");

    let args: Vec<OsString> = [
        "revboard",
        "--rcfile",
        rc.to_str().expect("utf8 path"),
        "--data",
        data.to_str().expect("utf8 path"),
        "--now",
        "2026-01-06",
        "rc.year=2026",
        "dashboard",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    revboard_core::run(args).expect("dashboard run");

    let bad: Vec<OsString> = [
        "revboard",
        "--rcfile",
        rc.to_str().expect("utf8 path"),
        "--data",
        data.to_str().expect("utf8 path"),
        "--now",
        "2026-01-06",
        "day",
        "2026-02-01",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    let err = revboard_core::run(bad).expect_err("future day is not selectable");
    assert!(format!("{err:#}").contains("future"));
}
