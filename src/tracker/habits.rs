use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    error::TrackerError,
    storage::document_store::Document,
    utils::{
        percentage::{ratio_percentage, Percentage},
        time::week_start,
    },
};

use super::streak::{compute_streaks, Streaks};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HabitsDocument {
    #[serde(default)]
    pub habits: Vec<Habit>,
    /// Completion days keyed by habit name. Kept sorted.
    #[serde(default, deserialize_with = "sorted_completions")]
    pub completions: BTreeMap<String, Vec<NaiveDate>>,
    #[serde(default)]
    pub notes: BTreeMap<String, Vec<HabitNote>>,
}

/// Older files append days in the order they were checked, so backfilled days may come last.
fn sorted_completions<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut completions = BTreeMap::<String, Vec<NaiveDate>>::deserialize(deserializer)?;
    for dates in completions.values_mut() {
        dates.sort_unstable();
        dates.dedup();
    }
    Ok(completions)
}

impl Document for HabitsDocument {
    const FILE_NAME: &'static str = "habits.json";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HabitRepr")]
pub struct Habit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_target: Option<u32>,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<NaiveDate>,
}

/// Older files list habits as bare names.
#[derive(Deserialize)]
#[serde(untagged)]
enum HabitRepr {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        weekly_target: Option<u32>,
        #[serde(default = "default_active")]
        active: bool,
        #[serde(default)]
        created: Option<NaiveDate>,
    },
}

fn default_active() -> bool {
    true
}

impl From<HabitRepr> for Habit {
    fn from(value: HabitRepr) -> Self {
        match value {
            HabitRepr::Name(name) => Habit {
                name,
                weekly_target: None,
                active: true,
                created: None,
            },
            HabitRepr::Detailed {
                name,
                weekly_target,
                active,
                created,
            } => Habit {
                name,
                weekly_target,
                active,
                created,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitNote {
    pub date: NaiveDate,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct HabitStatus {
    pub name: String,
    pub active: bool,
    pub done_today: bool,
    pub streaks: Streaks,
    pub done_this_week: u32,
    pub weekly_target: Option<u32>,
}

const KIND: &str = "Habit";

fn validate_name(name: &str) -> Result<&str, TrackerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::invalid("habit name", "name can't be empty"));
    }
    Ok(name)
}

fn validate_target(target: Option<u32>) -> Result<Option<u32>, TrackerError> {
    match target {
        Some(v) if !(1..=7).contains(&v) => Err(TrackerError::invalid(
            "weekly target",
            format!("{v} is not between 1 and 7"),
        )),
        v => Ok(v),
    }
}

impl HabitsDocument {
    /// Names are matched without surrounding whitespace, the way [HabitsDocument::add] stores them.
    pub fn get(&self, name: &str) -> Result<&Habit, TrackerError> {
        let name = name.trim();
        self.habits
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| TrackerError::not_found(KIND, name))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Habit, TrackerError> {
        let name = name.trim();
        self.habits
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| TrackerError::not_found(KIND, name))
    }

    pub fn add(
        &mut self,
        name: &str,
        weekly_target: Option<u32>,
        today: NaiveDate,
    ) -> Result<&Habit, TrackerError> {
        let name = validate_name(name)?;
        let weekly_target = validate_target(weekly_target)?;
        if self.get(name).is_ok() {
            return Err(TrackerError::duplicate(KIND, name));
        }
        self.habits.push(Habit {
            name: name.to_string(),
            weekly_target,
            active: true,
            created: Some(today),
        });
        Ok(&self.habits[self.habits.len() - 1])
    }

    /// Drops the habit together with its completions and notes.
    pub fn remove(&mut self, name: &str) -> Result<Habit, TrackerError> {
        let name = name.trim();
        let position = self
            .habits
            .iter()
            .position(|v| v.name == name)
            .ok_or_else(|| TrackerError::not_found(KIND, name))?;
        self.completions.remove(name);
        self.notes.remove(name);
        Ok(self.habits.remove(position))
    }

    /// Renames the habit and moves its completions and notes over to the new name.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), TrackerError> {
        let old = old.trim();
        let new = validate_name(new)?;
        self.get(old)?;
        if old == new {
            return Ok(());
        }
        if self.get(new).is_ok() {
            return Err(TrackerError::duplicate(KIND, new));
        }
        self.get_mut(old)?.name = new.to_string();
        if let Some(dates) = self.completions.remove(old) {
            self.completions.insert(new.to_string(), dates);
        }
        if let Some(notes) = self.notes.remove(old) {
            self.notes.insert(new.to_string(), notes);
        }
        Ok(())
    }

    /// Records a completion. Returns false if the day was already checked.
    pub fn check(&mut self, name: &str, date: NaiveDate) -> Result<bool, TrackerError> {
        let name = name.trim();
        let habit = self.get(name)?;
        if !habit.active {
            return Err(TrackerError::invalid(
                "habit",
                format!("`{name}` is archived, activate it first"),
            ));
        }
        let dates = self.completions.entry(name.to_string()).or_default();
        match dates.binary_search(&date) {
            Ok(_) => Ok(false),
            Err(position) => {
                dates.insert(position, date);
                Ok(true)
            }
        }
    }

    /// Removes a completion. Returns false if the day wasn't checked.
    pub fn uncheck(&mut self, name: &str, date: NaiveDate) -> Result<bool, TrackerError> {
        let name = name.trim();
        self.get(name)?;
        let Some(dates) = self.completions.get_mut(name) else {
            return Ok(false);
        };
        let before = dates.len();
        dates.retain(|v| *v != date);
        let removed = dates.len() != before;
        if dates.is_empty() {
            self.completions.remove(name);
        }
        Ok(removed)
    }

    /// Returns whether the flag actually changed.
    pub fn set_active(&mut self, name: &str, active: bool) -> Result<bool, TrackerError> {
        let habit = self.get_mut(name)?;
        let changed = habit.active != active;
        habit.active = active;
        Ok(changed)
    }

    pub fn set_target(&mut self, name: &str, target: Option<u32>) -> Result<(), TrackerError> {
        let target = validate_target(target)?;
        self.get_mut(name)?.weekly_target = target;
        Ok(())
    }

    pub fn add_note(
        &mut self,
        name: &str,
        date: NaiveDate,
        note: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let name = name.trim();
        self.get(name)?;
        let note = note.trim();
        if note.is_empty() {
            return Err(TrackerError::invalid("note", "note can't be empty"));
        }
        self.notes
            .entry(name.to_string())
            .or_default()
            .push(HabitNote {
                date,
                note: note.to_string(),
                timestamp,
            });
        Ok(())
    }

    pub fn notes_for(&self, name: &str) -> Result<&[HabitNote], TrackerError> {
        let name = name.trim();
        self.get(name)?;
        Ok(self.notes.get(name).map(Vec::as_slice).unwrap_or_default())
    }

    fn dates(&self, name: &str) -> &[NaiveDate] {
        self.completions
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn streaks(&self, name: &str, today: NaiveDate) -> Result<Streaks, TrackerError> {
        let name = name.trim();
        self.get(name)?;
        Ok(compute_streaks(self.dates(name).iter().copied(), today))
    }

    /// Completions in the Monday-started week containing `today`.
    pub fn done_this_week(&self, name: &str, today: NaiveDate) -> Result<u32, TrackerError> {
        let name = name.trim();
        self.get(name)?;
        let start = week_start(today);
        let end = start + Duration::days(6);
        Ok(self
            .dates(name)
            .iter()
            .filter(|v| **v >= start && **v <= end)
            .count() as u32)
    }

    /// Share of the last `days` days (today included) the habit was completed on.
    pub fn completion_rate(
        &self,
        name: &str,
        today: NaiveDate,
        days: u32,
    ) -> Result<Percentage, TrackerError> {
        let name = name.trim();
        self.get(name)?;
        if days == 0 {
            return Err(TrackerError::invalid("days", "should be at least 1"));
        }
        let first = today - Duration::days(days as i64 - 1);
        let done = self
            .dates(name)
            .iter()
            .filter(|v| **v >= first && **v <= today)
            .count();
        Ok(ratio_percentage(done, days as usize))
    }

    pub fn status(&self, today: NaiveDate) -> Vec<HabitStatus> {
        self.habits
            .iter()
            .map(|habit| {
                let dates = self.dates(&habit.name);
                let start = week_start(today);
                HabitStatus {
                    name: habit.name.clone(),
                    active: habit.active,
                    done_today: dates.contains(&today),
                    streaks: compute_streaks(dates.iter().copied(), today),
                    done_this_week: dates
                        .iter()
                        .filter(|v| **v >= start && **v <= today)
                        .count() as u32,
                    weekly_target: habit.weekly_target,
                }
            })
            .collect()
    }
}
