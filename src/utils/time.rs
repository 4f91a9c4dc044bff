use std::fmt::Display;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime};
use chrono_english::parse_date_string;
use clap::ValueEnum;

use crate::error::TrackerError;

/// Style of free-form dates. For Uk it's day/month/year, for Us it's month/day/year.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum DateStyle {
    #[default]
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Parses a calendar day. Accepts `today`, `yesterday`, `YYYY-MM-DD` and anything
/// `chrono_english` understands, like "2 days ago" or "15/03/2025".
pub fn parse_day(
    input: &str,
    style: DateStyle,
    now: DateTime<Local>,
) -> Result<NaiveDate, TrackerError> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "today" => return Ok(now.date_naive()),
        "yesterday" => return Ok(now.date_naive() - Duration::days(1)),
        "tomorrow" => return Ok(now.date_naive() + Duration::days(1)),
        _ => {}
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_date_string(trimmed, now, style.into())
        .map(|v| v.date_naive())
        .map_err(|e| TrackerError::invalid("date", format!("`{input}`: {e}")))
}

/// Parses wall clock time in `HH:MM` form.
pub fn parse_time(input: &str) -> Result<NaiveTime, TrackerError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .map_err(|_| TrackerError::invalid("time", format!("`{input}` is not HH:MM")))
}

/// Parses a duration given in minutes. Plain numbers are minutes, `1h30m`, `2h` and `45m` are
/// accepted as well.
pub fn parse_minutes(input: &str) -> Result<u32, TrackerError> {
    let input = input.trim().to_lowercase();
    let invalid = || TrackerError::invalid("duration", format!("`{input}`"));
    if let Ok(v) = input.parse::<u32>() {
        return Ok(v);
    }

    let (hours, rest) = match input.split_once('h') {
        Some((hours, rest)) => (hours.parse::<u32>().map_err(|_| invalid())?, rest),
        None => (0, input.as_str()),
    };
    let minutes = match rest.strip_suffix('m') {
        Some(minutes) => minutes.parse::<u32>().map_err(|_| invalid())?,
        None if rest.is_empty() => 0,
        None => return Err(invalid()),
    };
    hours
        .checked_mul(60)
        .and_then(|v| v.checked_add(minutes))
        .ok_or_else(|| TrackerError::invalid("duration", format!("`{input}` is too long")))
}

pub fn format_minutes(minutes: u64) -> String {
    if minutes >= 60 {
        format!("{}h{:02}m", minutes / 60, minutes % 60)
    } else {
        format!("{minutes}m")
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}
