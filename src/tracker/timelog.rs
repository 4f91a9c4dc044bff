use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::TrackerError,
    storage::{document_store::Document, record_log::LogRecord},
};

pub const TIME_LOG_FILE: &str = "time.jsonl";

/// One line of the time log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub date: NaiveDate,
    pub project: String,
    pub minutes: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub billable: bool,
}

impl LogRecord for TimeEntry {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl TimeEntry {
    /// Manual entry. The id is given by the log on append.
    pub fn manual(
        date: NaiveDate,
        project: &str,
        minutes: u32,
        description: &str,
        billable: bool,
    ) -> Result<Self, TrackerError> {
        if minutes == 0 {
            return Err(TrackerError::invalid("duration", "should be at least a minute"));
        }
        Ok(Self {
            id: 0,
            date,
            project: validate_project(project)?.to_string(),
            minutes,
            description: description.trim().to_string(),
            start_time: None,
            end_time: None,
            billable,
        })
    }

    /// Records the wall clock span of a manual entry. The end wraps past midnight.
    pub fn starting_at(mut self, start: NaiveTime) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(start + Duration::minutes(self.minutes as i64));
        self
    }
}

/// Side document holding the running timer, if any.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TimerDocument {
    #[serde(default)]
    pub timer: Option<ActiveTimer>,
}

impl Document for TimerDocument {
    const FILE_NAME: &'static str = "timer.json";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTimer {
    pub project: String,
    #[serde(default)]
    pub description: String,
    pub started: DateTime<Utc>,
    #[serde(default)]
    pub billable: bool,
}

impl ActiveTimer {
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u32 {
        let seconds = (now - self.started).num_seconds().max(0);
        ((seconds + 30) / 60) as u32
    }

    /// Turns the timer into a log entry dated on the local day it was started. Anything shorter
    /// than a minute is logged as one minute.
    pub fn finish(self, now: DateTime<Utc>) -> TimeEntry {
        let start = self.started.with_timezone(&Local);
        let end = now.with_timezone(&Local);
        TimeEntry {
            id: 0,
            date: start.date_naive(),
            minutes: self.elapsed_minutes(now).max(1),
            project: self.project,
            description: self.description,
            start_time: Some(start.time().with_nanosecond(0).unwrap_or(start.time())),
            end_time: Some(end.time().with_nanosecond(0).unwrap_or(end.time())),
            billable: self.billable,
        }
    }
}

fn validate_project(project: &str) -> Result<&str, TrackerError> {
    let project = project.trim();
    if project.is_empty() {
        return Err(TrackerError::invalid("project", "project can't be empty"));
    }
    Ok(project)
}

impl TimerDocument {
    pub fn start(
        &mut self,
        project: &str,
        description: &str,
        billable: bool,
        now: DateTime<Utc>,
    ) -> Result<&ActiveTimer, TrackerError> {
        if let Some(timer) = &self.timer {
            return Err(TrackerError::Conflict(format!(
                "Timer for `{}` is already running, stop it first",
                timer.project
            )));
        }
        let timer = self.timer.insert(ActiveTimer {
            project: validate_project(project)?.to_string(),
            description: description.trim().to_string(),
            started: now,
            billable,
        });
        Ok(&*timer)
    }

    /// Takes the running timer out of the document.
    pub fn stop(&mut self) -> Result<ActiveTimer, TrackerError> {
        self.timer
            .take()
            .ok_or_else(|| TrackerError::Conflict("No timer is running".into()))
    }
}

/// Which entries a listing or report covers. Bounds are inclusive.
#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub project: Option<String>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        self.from.map_or(true, |v| entry.date >= v)
            && self.to.map_or(true, |v| entry.date <= v)
            && self
                .project
                .as_ref()
                .map_or(true, |v| entry.project.eq_ignore_ascii_case(v))
    }

    pub fn apply<'a>(&self, entries: &'a [TimeEntry]) -> Vec<&'a TimeEntry> {
        let mut result = entries.iter().filter(|v| self.matches(v)).collect::<Vec<_>>();
        result.sort_by_key(|v| (v.date, v.start_time, v.id));
        result
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProjectTotal {
    pub minutes: u64,
    pub billable_minutes: u64,
    pub entries: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TimeReport {
    pub projects: BTreeMap<String, ProjectTotal>,
    pub total_minutes: u64,
    pub billable_minutes: u64,
}

/// Sums up entries per project.
pub fn build_report<'a>(entries: impl IntoIterator<Item = &'a TimeEntry>) -> TimeReport {
    let mut report = TimeReport::default();
    for entry in entries {
        let total = report.projects.entry(entry.project.clone()).or_default();
        total.minutes += entry.minutes as u64;
        total.entries += 1;
        report.total_minutes += entry.minutes as u64;
        if entry.billable {
            total.billable_minutes += entry.minutes as u64;
            report.billable_minutes += entry.minutes as u64;
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};

    use crate::error::TrackerError;

    use super::{build_report, EntryFilter, TimeEntry, TimerDocument};

    const DAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

    fn entry(id: u64, date: NaiveDate, project: &str, minutes: u32, billable: bool) -> TimeEntry {
        let mut entry = TimeEntry::manual(date, project, minutes, "", billable).unwrap();
        entry.id = id;
        entry
    }

    #[test]
    fn test_manual_span_wraps_past_midnight() {
        let late = entry(0, DAY, "ops", 60, false)
            .starting_at(NaiveTime::from_hms_opt(23, 30, 0).unwrap());
        assert_eq!(late.start_time, NaiveTime::from_hms_opt(23, 30, 0));
        assert_eq!(late.end_time, NaiveTime::from_hms_opt(0, 30, 0));
    }

    #[test]
    fn test_start_stop() {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap();
        let mut document = TimerDocument::default();
        document.start("client", "review", true, now).unwrap();
        assert!(matches!(
            document.start("other", "", false, now),
            Err(TrackerError::Conflict(_))
        ));

        let timer = document.stop().unwrap();
        assert!(document.timer.is_none());
        assert!(document.stop().is_err());

        let finished = timer.finish(now + Duration::minutes(90) + Duration::seconds(40));
        assert_eq!(finished.minutes, 91);
        assert_eq!(finished.project, "client");
        assert!(finished.billable);
        assert!(finished.start_time.is_some());
    }

    #[test]
    fn test_short_timer_counts_as_a_minute() {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 9, 0, 0).unwrap();
        let mut document = TimerDocument::default();
        document.start("x", "", false, now).unwrap();
        let entry = document.stop().unwrap().finish(now + Duration::seconds(5));
        assert_eq!(entry.minutes, 1);
    }

    #[test]
    fn test_manual_validation() {
        assert!(TimeEntry::manual(DAY, "x", 0, "", false).is_err());
        assert!(TimeEntry::manual(DAY, " ", 10, "", false).is_err());
    }

    #[test]
    fn test_filter_and_report() {
        let yesterday = DAY.pred_opt().unwrap();
        let entries = vec![
            entry(1, yesterday, "alpha", 30, true),
            entry(2, DAY, "alpha", 45, false),
            entry(3, DAY, "beta", 60, true),
        ];

        let today_only = EntryFilter {
            from: Some(DAY),
            to: Some(DAY),
            project: None,
        };
        let selected = today_only.apply(&entries);
        assert_eq!(selected.len(), 2);

        let report = build_report(selected);
        assert_eq!(report.total_minutes, 105);
        assert_eq!(report.billable_minutes, 60);
        assert_eq!(report.projects["alpha"].minutes, 45);

        let alpha = EntryFilter {
            project: Some("ALPHA".into()),
            ..Default::default()
        };
        let report = build_report(alpha.apply(&entries));
        assert_eq!(report.projects["alpha"].entries, 2);
        assert_eq!(report.projects["alpha"].billable_minutes, 30);
        assert_eq!(report.projects.len(), 1);
    }
}
