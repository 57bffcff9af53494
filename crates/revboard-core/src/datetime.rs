use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Duration,
  Local,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str =
  "revboard-time.toml";
const TIMEZONE_ENV_VAR: &str =
  "REVBOARD_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str =
  "REVBOARD_TIME_CONFIG";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
  timezone: Option<String>,
  time:     Option<TimezoneSection>
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
  timezone: Option<String>
}

/// Configured zone, or `None` to follow
/// the system local zone.
pub fn project_timezone()
-> Option<&'static Tz> {
  static PROJECT_TZ: OnceLock<
    Option<Tz>
  > = OnceLock::new();
  PROJECT_TZ
    .get_or_init(
      resolve_project_timezone
    )
    .as_ref()
}

/// Wall-clock "now" in the project zone.
#[must_use]
pub fn project_now() -> NaiveDateTime {
  match project_timezone() {
    | Some(tz) => {
      Utc::now()
        .with_timezone(tz)
        .naive_local()
    }
    | None => Local::now().naive_local()
  }
}

fn resolve_project_timezone()
-> Option<Tz> {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
  {
    if let Some(tz) = parse_timezone(
      &raw,
      TIMEZONE_ENV_VAR
    ) {
      return Some(tz);
    }
  }

  if let Some(path) =
    timezone_config_path()
    && let Some(tz) =
      load_timezone_from_file(&path)
  {
    return Some(tz);
  }

  tracing::debug!(
    "no project timezone configured; \
     using system local time"
  );
  None
}

fn timezone_config_path()
-> Option<PathBuf> {
  if let Ok(raw) = std::env::var(
    TIMEZONE_CONFIG_ENV_VAR
  ) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Some(PathBuf::from(
        trimmed
      ));
    }
  }

  std::env::current_dir().ok().map(
    |dir| {
      dir.join(TIMEZONE_CONFIG_FILE)
    }
  )
}

fn load_timezone_from_file(
  path: &PathBuf
) -> Option<Tz> {
  if !path.exists() {
    tracing::debug!(
      file = %path.display(),
      "timezone config file not found"
    );
    return None;
  }

  let raw = match fs::read_to_string(
    path
  ) {
    | Ok(raw) => raw,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed reading timezone config file"
      );
      return None;
    }
  };

  let parsed = match toml::from_str::<
    TimezoneConfig
  >(&raw)
  {
    | Ok(parsed) => parsed,
    | Err(err) => {
      tracing::error!(
        file = %path.display(),
        error = %err,
        "failed parsing timezone config file"
      );
      return None;
    }
  };

  let timezone =
    parsed.timezone.or_else(|| {
      parsed.time.and_then(|section| {
        section.timezone
      })
    });
  let Some(timezone) = timezone else {
    tracing::warn!(
      file = %path.display(),
      "timezone config had no timezone field"
    );
    return None;
  };

  parse_timezone(
    timezone.as_str(),
    &format!("file:{}", path.display())
  )
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::info!(
        source,
        timezone = %trimmed,
        "configured project timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Parses a pinned reference instant:
/// `YYYY-MM-DD` (noon), or a date with
/// `THH:MM` / `THH:MM:SS`.
#[tracing::instrument]
pub fn parse_instant(
  input: &str
) -> anyhow::Result<NaiveDateTime> {
  let token = input.trim();

  for fmt in
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
  {
    if let Ok(dt) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return Ok(dt);
    }
  }

  let date = parse_iso_date(token)
    .with_context(|| {
      format!(
        "invalid instant '{token}'; \
         expected YYYY-MM-DD or \
         YYYY-MM-DDTHH:MM[:SS]"
      )
    })?;
  Ok(date.and_time(noon()))
}

/// Resolves a day expression relative to
/// `today`: `today`, `yesterday`,
/// `tomorrow`, `YYYY-MM-DD`, `+N`/`-N`
/// (optional `d` suffix), or a bare day
/// of `year` (`1..=366`).
#[tracing::instrument(skip(today, year))]
pub fn parse_day_expr(
  input: &str,
  today: NaiveDate,
  year: i32
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "yesterday" => {
      return add_days(today, -1);
    }
    | "tomorrow" => {
      return add_days(today, 1);
    }
    | _ => {}
  }

  if let Ok(date) = parse_iso_date(token)
  {
    return Ok(date);
  }

  if let Some(caps) =
    relative_day_regex()?
      .captures(&lower)
  {
    let offset: i64 = caps["num"]
      .parse()
      .context(
        "invalid relative day offset"
      )?;
    return add_days(today, offset);
  }

  if token.len() <= 3
    && !token.is_empty()
    && token
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    let ordinal: u32 = token
      .parse()
      .context("invalid day number")?;
    return NaiveDate::from_yo_opt(
      year, ordinal
    )
    .ok_or_else(|| {
      anyhow!(
        "day {ordinal} does not exist \
         in {year}"
      )
    });
  }

  Err(anyhow!(
    "unrecognized day expression: \
     {token}"
  ))
}

fn relative_day_regex()
-> anyhow::Result<&'static Regex> {
  static RELATIVE_DAY: OnceLock<
    Result<Regex, regex::Error>
  > = OnceLock::new();
  RELATIVE_DAY
    .get_or_init(|| {
      Regex::new(
        r"^(?P<num>[+-]\d{1,5})d?$"
      )
    })
    .as_ref()
    .map_err(|e| {
      anyhow!(
        "internal regex compile \
         failure: {e}"
      )
    })
}

pub fn parse_iso_date(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "invalid date '{}'",
      raw.trim()
    )
  })
}

/// `Thursday, January 1, 2026`
#[must_use]
pub fn format_long_date(
  date: NaiveDate
) -> String {
  date
    .format("%A, %B %-d, %Y")
    .to_string()
}

/// `Jan 1, 2026`
#[must_use]
pub fn format_short_date(
  date: NaiveDate
) -> String {
  date.format("%b %-d, %Y").to_string()
}

#[must_use]
pub fn month_abbrev(
  month: u32
) -> &'static str {
  match month {
    | 1 => "Jan",
    | 2 => "Feb",
    | 3 => "Mar",
    | 4 => "Apr",
    | 5 => "May",
    | 6 => "Jun",
    | 7 => "Jul",
    | 8 => "Aug",
    | 9 => "Sep",
    | 10 => "Oct",
    | 11 => "Nov",
    | 12 => "Dec",
    | _ => "???"
  }
}

pub fn first_day_of_year(
  year: i32
) -> anyhow::Result<NaiveDate> {
  NaiveDate::from_ymd_opt(year, 1, 1)
    .ok_or_else(|| {
      anyhow!("year out of range: {year}")
    })
}

pub fn last_day_of_year(
  year: i32
) -> anyhow::Result<NaiveDate> {
  NaiveDate::from_ymd_opt(year, 12, 31)
    .ok_or_else(|| {
      anyhow!("year out of range: {year}")
    })
}

#[must_use]
pub fn days_in_year(year: i32) -> u32 {
  if NaiveDate::from_ymd_opt(year, 2, 29)
    .is_some()
  {
    366
  } else {
    365
  }
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> anyhow::Result<NaiveDate> {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .ok_or_else(|| {
      anyhow!(
        "date out of range: {date} \
         {days:+} days"
      )
    })
}

#[must_use]
pub fn is_in_year(
  date: NaiveDate,
  year: i32
) -> bool {
  date.year() == year
}

fn noon() -> NaiveTime {
  NaiveTime::MIN + Duration::hours(12)
}
