use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::TrackerError, storage::document_store::Document};

use super::allocate_id;

#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingsDocument {
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    #[serde(default = "first_id")]
    pub next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for MeetingsDocument {
    fn default() -> Self {
        Self {
            meetings: vec![],
            next_id: first_id(),
        }
    }
}

impl Document for MeetingsDocument {
    const FILE_NAME: &'static str = "meetings.json";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: u64,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub done: bool,
}

/// An open action item together with the meeting it came from. `number` is 1-based.
#[derive(Debug)]
pub struct OpenAction<'a> {
    pub meeting: &'a Meeting,
    pub number: usize,
    pub item: &'a ActionItem,
}

const KIND: &str = "Meeting";

fn non_empty<'a>(what: &'static str, value: &'a str) -> Result<&'a str, TrackerError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TrackerError::invalid(what, format!("{what} can't be empty")));
    }
    Ok(value)
}

impl MeetingsDocument {
    pub fn get(&self, id: u64) -> Result<&Meeting, TrackerError> {
        self.meetings
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Meeting, TrackerError> {
        self.meetings
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))
    }

    pub fn create(
        &mut self,
        title: &str,
        date: NaiveDate,
        attendees: &[String],
        now: DateTime<Utc>,
    ) -> Result<&Meeting, TrackerError> {
        let title = non_empty("title", title)?;
        let mut attendees = attendees
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>();
        attendees.dedup();

        let id = allocate_id(&mut self.next_id, self.meetings.iter().map(|v| v.id));
        self.meetings.push(Meeting {
            id,
            title: title.to_string(),
            date,
            attendees,
            notes: vec![],
            action_items: vec![],
            created: now,
        });
        Ok(&self.meetings[self.meetings.len() - 1])
    }

    pub fn add_note(&mut self, id: u64, note: &str) -> Result<(), TrackerError> {
        let note = non_empty("note", note)?;
        self.get_mut(id)?.notes.push(note.to_string());
        Ok(())
    }

    /// Returns the 1-based number of the new action item.
    pub fn add_action(
        &mut self,
        id: u64,
        text: &str,
        owner: Option<&str>,
    ) -> Result<usize, TrackerError> {
        let text = non_empty("action", text)?;
        let meeting = self.get_mut(id)?;
        meeting.action_items.push(ActionItem {
            text: text.to_string(),
            owner: owner
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            done: false,
        });
        Ok(meeting.action_items.len())
    }

    /// Marks an action item done. Returns false if it already was.
    pub fn complete_action(&mut self, id: u64, number: usize) -> Result<bool, TrackerError> {
        let meeting = self.get_mut(id)?;
        let item = number
            .checked_sub(1)
            .and_then(|index| meeting.action_items.get_mut(index))
            .ok_or_else(|| TrackerError::not_found("Action item", format!("{id}/{number}")))?;
        let changed = !item.done;
        item.done = true;
        Ok(changed)
    }

    pub fn remove(&mut self, id: u64) -> Result<Meeting, TrackerError> {
        let position = self
            .meetings
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))?;
        Ok(self.meetings.remove(position))
    }

    /// Newest meeting first.
    pub fn listing(&self) -> Vec<&Meeting> {
        let mut meetings = self.meetings.iter().collect::<Vec<_>>();
        meetings.sort_by_key(|v| std::cmp::Reverse((v.date, v.id)));
        meetings
    }

    pub fn open_actions(&self) -> Vec<OpenAction<'_>> {
        let mut meetings = self.meetings.iter().collect::<Vec<_>>();
        meetings.sort_by_key(|v| (v.date, v.id));
        meetings
            .into_iter()
            .flat_map(|meeting| {
                meeting
                    .action_items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| !item.done)
                    .map(move |(index, item)| OpenAction {
                        meeting,
                        number: index + 1,
                        item,
                    })
            })
            .collect()
    }

    /// Case-insensitive match over titles, attendees, notes and action items.
    pub fn search(&self, query: &str) -> Vec<&Meeting> {
        let query = query.trim().to_lowercase();
        let hit = |v: &String| v.to_lowercase().contains(&query);
        self.meetings
            .iter()
            .filter(|v| {
                hit(&v.title)
                    || v.attendees.iter().any(hit)
                    || v.notes.iter().any(hit)
                    || v.action_items.iter().any(|item| hit(&item.text))
            })
            .collect()
    }
}
