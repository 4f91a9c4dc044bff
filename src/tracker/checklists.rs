use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::TrackerError,
    storage::document_store::Document,
    utils::percentage::{ratio_percentage, Percentage},
};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChecklistsDocument {
    #[serde(default)]
    pub checklists: Vec<Checklist>,
}

impl Document for ChecklistsDocument {
    const FILE_NAME: &'static str = "checklists.json";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub name: String,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

impl Checklist {
    pub fn progress(&self) -> (usize, Percentage) {
        let done = self.items.iter().filter(|v| v.done).count();
        (done, ratio_percentage(done, self.items.len()))
    }

    fn item_mut(&mut self, number: usize) -> Result<&mut ChecklistItem, TrackerError> {
        let name = &self.name;
        let key = format!("{name}/{number}");
        number
            .checked_sub(1)
            .and_then(|index| self.items.get_mut(index))
            .ok_or_else(|| TrackerError::not_found("Checklist item", key))
    }
}

const KIND: &str = "Checklist";

fn validate_name(name: &str) -> Result<&str, TrackerError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrackerError::invalid("checklist name", "name can't be empty"));
    }
    Ok(name)
}

impl ChecklistsDocument {
    /// Names are matched without surrounding whitespace, the way they are stored.
    pub fn get(&self, name: &str) -> Result<&Checklist, TrackerError> {
        let name = name.trim();
        self.checklists
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| TrackerError::not_found(KIND, name))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Checklist, TrackerError> {
        let name = name.trim();
        self.checklists
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| TrackerError::not_found(KIND, name))
    }

    pub fn create(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), TrackerError> {
        let name = validate_name(name)?;
        if self.get(name).is_ok() {
            return Err(TrackerError::duplicate(KIND, name));
        }
        self.checklists.push(Checklist {
            name: name.to_string(),
            items: vec![],
            created: now,
        });
        Ok(())
    }

    /// Returns the 1-based number of the new item.
    pub fn add_item(&mut self, name: &str, text: &str) -> Result<usize, TrackerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TrackerError::invalid("item", "text can't be empty"));
        }
        let checklist = self.get_mut(name)?;
        checklist.items.push(ChecklistItem {
            text: text.to_string(),
            done: false,
        });
        Ok(checklist.items.len())
    }

    /// Sets the done flag of an item. Returns whether anything changed.
    pub fn set_done(&mut self, name: &str, number: usize, done: bool) -> Result<bool, TrackerError> {
        let item = self.get_mut(name)?.item_mut(number)?;
        let changed = item.done != done;
        item.done = done;
        Ok(changed)
    }

    pub fn remove_item(&mut self, name: &str, number: usize) -> Result<ChecklistItem, TrackerError> {
        let checklist = self.get_mut(name)?;
        checklist.item_mut(number)?;
        Ok(checklist.items.remove(number - 1))
    }

    /// Unchecks every item so the checklist can be reused.
    pub fn reset(&mut self, name: &str) -> Result<usize, TrackerError> {
        let checklist = self.get_mut(name)?;
        let mut changed = 0;
        for item in checklist.items.iter_mut().filter(|v| v.done) {
            item.done = false;
            changed += 1;
        }
        Ok(changed)
    }

    pub fn remove(&mut self, name: &str) -> Result<Checklist, TrackerError> {
        let name = name.trim();
        let position = self
            .checklists
            .iter()
            .position(|v| v.name == name)
            .ok_or_else(|| TrackerError::not_found(KIND, name))?;
        Ok(self.checklists.remove(position))
    }

    /// Adds a previously exported checklist, optionally under another name.
    pub fn import(
        &mut self,
        mut checklist: Checklist,
        name: Option<&str>,
    ) -> Result<&Checklist, TrackerError> {
        if let Some(name) = name {
            checklist.name = name.to_string();
        }
        checklist.name = validate_name(&checklist.name)?.to_string();
        if self.get(&checklist.name).is_ok() {
            return Err(TrackerError::duplicate(KIND, &checklist.name));
        }
        checklist.items.retain(|v| !v.text.trim().is_empty());
        self.checklists.push(checklist);
        Ok(&self.checklists[self.checklists.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::error::TrackerError;

    use super::{Checklist, ChecklistsDocument};

    fn packing() -> ChecklistsDocument {
        let mut document = ChecklistsDocument::default();
        document.create("packing", Utc::now()).unwrap();
        for item in ["passport", "charger", "socks"] {
            document.add_item("packing", item).unwrap();
        }
        document
    }

    #[test]
    fn test_duplicate_names() {
        let mut document = packing();
        assert!(matches!(
            document.create("packing", Utc::now()),
            Err(TrackerError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_names_are_matched_trimmed() {
        let mut document = ChecklistsDocument::default();
        document.create(" a ", Utc::now()).unwrap();
        assert_eq!(document.get("a").unwrap().name, "a");
        assert_eq!(document.add_item(" a ", "first").unwrap(), 1);
        assert!(document.set_done("a ", 1, true).unwrap());
        assert!(matches!(
            document.create("a", Utc::now()),
            Err(TrackerError::Duplicate { .. })
        ));
        assert!(document.remove(" a").is_ok());
        assert!(document.checklists.is_empty());
    }

    #[test]
    fn test_check_uncheck_progress() {
        let mut document = packing();
        assert!(document.set_done("packing", 2, true).unwrap());
        let (done, percentage) = document.get("packing").unwrap().progress();
        assert_eq!(done, 1);
        assert_eq!(percentage.to_string(), "33%");

        assert!(document.set_done("packing", 2, false).unwrap());
        assert!(!document.set_done("packing", 2, false).unwrap());
        assert!(document.set_done("packing", 4, true).is_err());
        assert!(document.set_done("packing", 0, true).is_err());
    }

    #[test]
    fn test_reset_and_remove_item() {
        let mut document = packing();
        document.set_done("packing", 1, true).unwrap();
        document.set_done("packing", 3, true).unwrap();
        assert_eq!(document.reset("packing").unwrap(), 2);
        assert_eq!(document.remove_item("packing", 2).unwrap().text, "charger");
        assert_eq!(document.get("packing").unwrap().items.len(), 2);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut document = packing();
        document.set_done("packing", 1, true).unwrap();
        let exported = serde_json::to_string(document.get("packing").unwrap()).unwrap();

        let mut other = ChecklistsDocument::default();
        let imported = other
            .import(serde_json::from_str::<Checklist>(&exported).unwrap(), None)
            .unwrap();
        assert_eq!(imported, document.get("packing").unwrap());

        assert!(document
            .import(serde_json::from_str::<Checklist>(&exported).unwrap(), None)
            .is_err());
        let renamed = document
            .import(
                serde_json::from_str::<Checklist>(&exported).unwrap(),
                Some("packing-2"),
            )
            .unwrap();
        assert_eq!(renamed.items.len(), 3);
    }
}
