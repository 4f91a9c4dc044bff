use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::TrackerError, storage::document_store::Document};

use super::{
    allocate_id,
    streak::{compute_streaks, Streaks},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct JournalDocument {
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
    #[serde(default = "first_id")]
    pub next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for JournalDocument {
    fn default() -> Self {
        Self {
            entries: vec![],
            next_id: first_id(),
        }
    }
}

impl Document for JournalDocument {
    const FILE_NAME: &'static str = "journal.json";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: u64,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<u8>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Format of `journal export`. Ids are not part of it, import assigns new ones.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct JournalExport {
    pub entries: Vec<ExportedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    #[serde(default)]
    pub mood: Option<u8>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub struct JournalStats {
    pub entries: usize,
    pub days: Streaks,
    pub average_mood: Option<f64>,
}

const KIND: &str = "Journal entry";

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut tags = tags
        .iter()
        .map(|v| v.trim().trim_start_matches('#').to_lowercase())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>();
    tags.sort();
    tags.dedup();
    tags
}

impl JournalDocument {
    pub fn write(
        &mut self,
        date: NaiveDate,
        text: &str,
        mood: Option<u8>,
        tags: &[String],
        timestamp: DateTime<Utc>,
    ) -> Result<&JournalEntry, TrackerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TrackerError::invalid("entry", "text can't be empty"));
        }
        if let Some(mood) = mood {
            if !(1..=5).contains(&mood) {
                return Err(TrackerError::invalid(
                    "mood",
                    format!("{mood} is not between 1 and 5"),
                ));
            }
        }
        let id = allocate_id(&mut self.next_id, self.entries.iter().map(|v| v.id));
        self.entries.push(JournalEntry {
            id,
            date,
            timestamp,
            text: text.to_string(),
            mood,
            tags: normalize_tags(tags),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn remove(&mut self, id: u64) -> Result<JournalEntry, TrackerError> {
        let position = self
            .entries
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))?;
        Ok(self.entries.remove(position))
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Vec<&JournalEntry> {
        let mut entries = self.entries.iter().collect::<Vec<_>>();
        entries.sort_by_key(|v| std::cmp::Reverse((v.date, v.timestamp, v.id)));
        entries.truncate(limit);
        entries
    }

    pub fn on_date(&self, date: NaiveDate) -> Vec<&JournalEntry> {
        let mut entries = self
            .entries
            .iter()
            .filter(|v| v.date == date)
            .collect::<Vec<_>>();
        entries.sort_by_key(|v| (v.timestamp, v.id));
        entries
    }

    /// Case-insensitive match over text and tags.
    pub fn search(&self, query: &str) -> Vec<&JournalEntry> {
        let query = query.trim().trim_start_matches('#').to_lowercase();
        self.entries
            .iter()
            .filter(|v| v.text.to_lowercase().contains(&query) || v.tags.contains(&query))
            .collect()
    }

    pub fn stats(&self, today: NaiveDate) -> JournalStats {
        let moods = self.entries.iter().filter_map(|v| v.mood).collect::<Vec<_>>();
        let average_mood = if moods.is_empty() {
            None
        } else {
            Some(moods.iter().map(|v| *v as f64).sum::<f64>() / moods.len() as f64)
        };
        JournalStats {
            entries: self.entries.len(),
            days: compute_streaks(self.entries.iter().map(|v| v.date), today),
            average_mood,
        }
    }

    pub fn export(&self) -> JournalExport {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|v| (v.date, v.timestamp, v.id));
        JournalExport {
            entries: entries
                .into_iter()
                .map(|v| ExportedEntry {
                    date: v.date,
                    timestamp: v.timestamp,
                    text: v.text,
                    mood: v.mood,
                    tags: v.tags,
                })
                .collect(),
        }
    }

    /// Appends exported entries with fresh ids. Entries matching one that was in the journal
    /// before the import (same day, time and text) are skipped. Returns how many were imported.
    pub fn import(&mut self, export: JournalExport) -> usize {
        let existing = self.entries.len();
        let mut imported = 0;
        for entry in export.entries {
            let exists = self.entries[..existing].iter().any(|v| {
                v.date == entry.date
                    && v.timestamp == entry.timestamp
                    && v.text == entry.text.trim()
            });
            if exists || entry.text.trim().is_empty() {
                continue;
            }
            let id = allocate_id(&mut self.next_id, self.entries.iter().map(|v| v.id));
            self.entries.push(JournalEntry {
                id,
                date: entry.date,
                timestamp: entry.timestamp,
                text: entry.text.trim().to_string(),
                mood: entry.mood.filter(|v| (1..=5).contains(v)),
                tags: normalize_tags(&entry.tags),
            });
            imported += 1;
        }
        imported
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    use super::{JournalDocument, JournalExport};

    const TODAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

    fn at(hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, hour, 0, 0).unwrap()
    }

    fn sample() -> JournalDocument {
        let mut document = JournalDocument::default();
        document
            .write(TODAY - Duration::days(1), "Quiet day", Some(3), &[], at(8))
            .unwrap();
        document
            .write(
                TODAY,
                "Shipped the release",
                Some(5),
                &["#Work".into(), "work".into()],
                at(9),
            )
            .unwrap();
        document
            .write(TODAY, "Long walk", None, &["outside".into()], at(18))
            .unwrap();
        document
    }

    #[test]
    fn test_write_validates() {
        let mut document = JournalDocument::default();
        assert!(document.write(TODAY, "  ", None, &[], at(1)).is_err());
        assert!(document.write(TODAY, "ok", Some(6), &[], at(1)).is_err());
        assert!(document.entries.is_empty());
    }

    #[test]
    fn test_tags_are_normalized() {
        let document = sample();
        assert_eq!(document.entries[1].tags, vec!["work".to_string()]);
    }

    #[test]
    fn test_queries() {
        let document = sample();
        assert_eq!(document.on_date(TODAY).len(), 2);
        assert_eq!(document.recent(1)[0].text, "Long walk");
        assert_eq!(document.search("SHIPPED").len(), 1);
        assert_eq!(document.search("#work").len(), 1);
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats(TODAY);
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.days.current, 2);
        assert_eq!(stats.average_mood, Some(4.));
    }

    #[test]
    fn test_export_import_round_trip() {
        let original = sample();
        let exported = serde_json::to_string(&original.export()).unwrap();

        let mut restored = JournalDocument::default();
        let imported = restored.import(serde_json::from_str::<JournalExport>(&exported).unwrap());
        assert_eq!(imported, 3);
        assert_eq!(
            restored.entries.iter().map(|v| &v.text).collect::<Vec<_>>(),
            original.entries.iter().map(|v| &v.text).collect::<Vec<_>>()
        );

        // importing the same export again changes nothing
        let again = restored.import(serde_json::from_str::<JournalExport>(&exported).unwrap());
        assert_eq!(again, 0);
        assert_eq!(restored.entries.len(), 3);
    }

    #[test]
    fn test_import_keeps_same_text_written_twice_a_day() {
        let mut original = JournalDocument::default();
        original.write(TODAY, "Gym", None, &[], at(7)).unwrap();
        original.write(TODAY, "Gym", None, &[], at(19)).unwrap();
        let exported = serde_json::to_string(&original.export()).unwrap();

        let mut restored = JournalDocument::default();
        let imported = restored.import(serde_json::from_str::<JournalExport>(&exported).unwrap());
        assert_eq!(imported, 2);
        assert_eq!(restored.on_date(TODAY).len(), 2);

        let again = restored.import(serde_json::from_str::<JournalExport>(&exported).unwrap());
        assert_eq!(again, 0);
        assert_eq!(restored.entries.len(), 2);
    }

    #[test]
    fn test_remove_keeps_ids_growing() {
        let mut document = sample();
        document.remove(3).unwrap();
        assert!(document.remove(3).is_err());
        let id = document.write(TODAY, "again", None, &[], at(20)).unwrap().id;
        assert_eq!(id, 4);
    }
}
