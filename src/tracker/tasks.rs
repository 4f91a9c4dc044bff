use std::{cmp::Ordering, fmt::Display};

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{error::TrackerError, storage::document_store::Document};

use super::allocate_id;

#[derive(Debug, Serialize, Deserialize)]
pub struct TasksDocument {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default = "first_id")]
    pub next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for TasksDocument {
    fn default() -> Self {
        Self {
            tasks: vec![],
            next_id: first_id(),
        }
    }
}

impl Document for TasksDocument {
    const FILE_NAME: &'static str = "tasks.json";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub description: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && matches!(self.due, Some(due) if due < today)
    }
}

/// Tasks split the way `list` shows them.
#[derive(Debug)]
pub struct TaskListing<'a> {
    pub pending: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
}

const KIND: &str = "Task";

fn validate_description(description: &str) -> Result<&str, TrackerError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(TrackerError::invalid(
            "description",
            "description can't be empty",
        ));
    }
    Ok(description)
}

/// Pending order: priority (unset last), due date (unset last), then id.
fn pending_order(a: &Task, b: &Task) -> Ordering {
    fn rank<T: Ord>(v: Option<T>) -> (bool, Option<T>) {
        (v.is_none(), v)
    }
    rank(a.priority)
        .cmp(&rank(b.priority))
        .then_with(|| rank(a.due).cmp(&rank(b.due)))
        .then_with(|| a.id.cmp(&b.id))
}

impl TasksDocument {
    pub fn get(&self, id: u64) -> Result<&Task, TrackerError> {
        self.tasks
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Task, TrackerError> {
        self.tasks
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))
    }

    pub fn add(
        &mut self,
        description: &str,
        priority: Option<Priority>,
        due: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<&Task, TrackerError> {
        let description = validate_description(description)?;
        let id = allocate_id(&mut self.next_id, self.tasks.iter().map(|v| v.id));
        self.tasks.push(Task {
            id,
            description: description.to_string(),
            created: now,
            completed: false,
            completed_at: None,
            priority,
            due,
        });
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Returns false if the task was already completed.
    pub fn complete(&mut self, id: u64, now: DateTime<Utc>) -> Result<bool, TrackerError> {
        let task = self.get_mut(id)?;
        if task.completed {
            return Ok(false);
        }
        task.completed = true;
        task.completed_at = Some(now);
        Ok(true)
    }

    /// Returns false if the task wasn't completed.
    pub fn reopen(&mut self, id: u64) -> Result<bool, TrackerError> {
        let task = self.get_mut(id)?;
        if !task.completed {
            return Ok(false);
        }
        task.completed = false;
        task.completed_at = None;
        Ok(true)
    }

    pub fn remove(&mut self, id: u64) -> Result<Task, TrackerError> {
        let position = self
            .tasks
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))?;
        Ok(self.tasks.remove(position))
    }

    pub fn edit(&mut self, id: u64, description: &str) -> Result<(), TrackerError> {
        let description = validate_description(description)?;
        self.get_mut(id)?.description = description.to_string();
        Ok(())
    }

    pub fn set_priority(&mut self, id: u64, priority: Option<Priority>) -> Result<(), TrackerError> {
        self.get_mut(id)?.priority = priority;
        Ok(())
    }

    pub fn set_due(&mut self, id: u64, due: Option<NaiveDate>) -> Result<(), TrackerError> {
        self.get_mut(id)?.due = due;
        Ok(())
    }

    /// Drops completed tasks, returning how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|v| !v.completed);
        before - self.tasks.len()
    }

    pub fn search(&self, query: &str) -> Vec<&Task> {
        let query = query.to_lowercase();
        self.tasks
            .iter()
            .filter(|v| v.description.to_lowercase().contains(&query))
            .collect()
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<&Task> {
        let mut tasks = self
            .tasks
            .iter()
            .filter(|v| v.is_overdue(today))
            .collect::<Vec<_>>();
        tasks.sort_by(|a, b| pending_order(a, b));
        tasks
    }

    /// Pending tasks due on `today`.
    pub fn due_on(&self, today: NaiveDate) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|v| !v.completed && v.due == Some(today))
            .collect()
    }

    pub fn listing(&self) -> TaskListing<'_> {
        let (mut pending, mut completed): (Vec<&Task>, Vec<&Task>) =
            self.tasks.iter().partition(|v| !v.completed);
        pending.sort_by(|a, b| pending_order(a, b));
        completed.sort_by_key(|v| (v.completed_at, v.id));
        TaskListing { pending, completed }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use crate::error::TrackerError;

    use super::{Priority, TasksDocument};

    const TODAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_add_done_list() {
        let mut document = TasksDocument::default();
        let id = document.add("foo", None, None, now()).unwrap().id;
        assert_eq!(id, 1);
        assert!(document.complete(1, now()).unwrap());

        let listing = document.listing();
        assert!(listing.pending.is_empty());
        assert_eq!(listing.completed[0].id, 1);
        assert_eq!(listing.completed[0].completed_at, Some(now()));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut document = TasksDocument::default();
        document.add("a", None, None, now()).unwrap();
        document.add("b", None, None, now()).unwrap();
        document.remove(2).unwrap();
        assert_eq!(document.add("c", None, None, now()).unwrap().id, 3);
        assert_eq!(document.next_id, 4);
    }

    #[test]
    fn test_id_recovers_from_stale_next_id() {
        let mut document: TasksDocument = serde_json::from_str(
            r#"{"tasks": [{"id": 7, "description": "x", "created": "2025-03-01T00:00:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(document.next_id, 1);
        assert_eq!(document.add("y", None, None, now()).unwrap().id, 8);
    }

    #[test]
    fn test_reopen_and_repeat_completion() {
        let mut document = TasksDocument::default();
        document.add("a", None, None, now()).unwrap();
        assert!(document.complete(1, now()).unwrap());
        assert!(!document.complete(1, now()).unwrap());
        assert!(document.reopen(1).unwrap());
        assert!(!document.reopen(1).unwrap());
        assert_eq!(document.get(1).unwrap().completed_at, None);
    }

    #[test]
    fn test_not_found_and_empty_description() {
        let mut document = TasksDocument::default();
        assert_eq!(
            document.complete(9, now()),
            Err(TrackerError::not_found("Task", 9))
        );
        assert!(document.add("  ", None, None, now()).is_err());
    }

    #[test]
    fn test_pending_order() {
        let mut document = TasksDocument::default();
        document.add("plain", None, None, now()).unwrap();
        document
            .add("low", Some(Priority::Low), None, now())
            .unwrap();
        document
            .add("high later", Some(Priority::High), Some(TODAY + Duration::days(5)), now())
            .unwrap();
        document
            .add("high soon", Some(Priority::High), Some(TODAY), now())
            .unwrap();

        let order = document
            .listing()
            .pending
            .iter()
            .map(|v| v.description.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["high soon", "high later", "low", "plain"]);
    }

    #[test]
    fn test_overdue_search_clear() {
        let mut document = TasksDocument::default();
        document
            .add("Pay rent", None, Some(TODAY - Duration::days(1)), now())
            .unwrap();
        document.add("Call mom", None, Some(TODAY), now()).unwrap();
        document.add("pay taxes", None, None, now()).unwrap();

        assert_eq!(document.overdue(TODAY).len(), 1);
        assert_eq!(document.due_on(TODAY)[0].description, "Call mom");
        assert_eq!(document.search("PAY").len(), 2);

        document.complete(1, now()).unwrap();
        assert!(document.overdue(TODAY).is_empty());
        assert_eq!(document.clear_completed(), 1);
        assert_eq!(document.tasks.len(), 2);
    }
}
