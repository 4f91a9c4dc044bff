use std::fmt::Display;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{error::TrackerError, storage::document_store::Document};

use super::allocate_id;

#[derive(Debug, Serialize, Deserialize)]
pub struct RetrosDocument {
    #[serde(default)]
    pub retros: Vec<Retro>,
    #[serde(default = "first_id")]
    pub next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for RetrosDocument {
    fn default() -> Self {
        Self {
            retros: vec![],
            next_id: first_id(),
        }
    }
}

impl Document for RetrosDocument {
    const FILE_NAME: &'static str = "retros.json";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retro {
    pub id: u64,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub items: Vec<RetroItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RetroCategory {
    #[value(aliases = ["good", "well", "went_well"])]
    WentWell,
    #[value(aliases = ["improve", "bad", "to_improve"])]
    ToImprove,
    #[value(aliases = ["todo", "actions"])]
    Action,
}

impl Display for RetroCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetroCategory::WentWell => write!(f, "Went well"),
            RetroCategory::ToImprove => write!(f, "To improve"),
            RetroCategory::Action => write!(f, "Action items"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetroItem {
    pub category: RetroCategory,
    pub text: String,
    #[serde(default)]
    pub votes: u32,
}

/// Items of one category, most voted first. `number` is the 1-based position in the retro.
#[derive(Debug)]
pub struct RetroSection<'a> {
    pub category: RetroCategory,
    pub items: Vec<(usize, &'a RetroItem)>,
}

const KIND: &str = "Retrospective";

impl Retro {
    pub fn sections(&self) -> Vec<RetroSection<'_>> {
        [
            RetroCategory::WentWell,
            RetroCategory::ToImprove,
            RetroCategory::Action,
        ]
        .into_iter()
        .map(|category| {
            let mut items = self
                .items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.category == category)
                .map(|(index, item)| (index + 1, item))
                .collect::<Vec<_>>();
            items.sort_by_key(|(number, item)| (std::cmp::Reverse(item.votes), *number));
            RetroSection { category, items }
        })
        .collect()
    }

    fn item_mut(&mut self, number: usize) -> Result<&mut RetroItem, TrackerError> {
        let id = self.id;
        number
            .checked_sub(1)
            .and_then(|index| self.items.get_mut(index))
            .ok_or_else(|| TrackerError::not_found("Retro item", format!("{id}/{number}")))
    }
}

impl RetrosDocument {
    pub fn get(&self, id: u64) -> Result<&Retro, TrackerError> {
        self.retros
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Retro, TrackerError> {
        self.retros
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))
    }

    pub fn create(&mut self, title: &str, date: NaiveDate) -> Result<&Retro, TrackerError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TrackerError::invalid("title", "title can't be empty"));
        }
        let id = allocate_id(&mut self.next_id, self.retros.iter().map(|v| v.id));
        self.retros.push(Retro {
            id,
            title: title.to_string(),
            date,
            items: vec![],
        });
        Ok(&self.retros[self.retros.len() - 1])
    }

    /// Returns the 1-based number of the new item.
    pub fn add_item(
        &mut self,
        id: u64,
        category: RetroCategory,
        text: &str,
    ) -> Result<usize, TrackerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TrackerError::invalid("item", "text can't be empty"));
        }
        let retro = self.get_mut(id)?;
        retro.items.push(RetroItem {
            category,
            text: text.to_string(),
            votes: 0,
        });
        Ok(retro.items.len())
    }

    /// Returns the new vote count.
    pub fn vote(&mut self, id: u64, number: usize) -> Result<u32, TrackerError> {
        let item = self.get_mut(id)?.item_mut(number)?;
        item.votes += 1;
        Ok(item.votes)
    }

    pub fn remove_item(&mut self, id: u64, number: usize) -> Result<RetroItem, TrackerError> {
        let retro = self.get_mut(id)?;
        retro.item_mut(number)?;
        Ok(retro.items.remove(number - 1))
    }

    pub fn remove(&mut self, id: u64) -> Result<Retro, TrackerError> {
        let position = self
            .retros
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))?;
        Ok(self.retros.remove(position))
    }

    /// Newest first.
    pub fn listing(&self) -> Vec<&Retro> {
        let mut retros = self.retros.iter().collect::<Vec<_>>();
        retros.sort_by_key(|v| std::cmp::Reverse((v.date, v.id)));
        retros
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use clap::ValueEnum;

    use super::{RetroCategory, RetrosDocument};

    const DAY: NaiveDate = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();

    #[test]
    fn test_sections_are_sorted_by_votes() {
        let mut document = RetrosDocument::default();
        let id = document.create("Sprint 12", DAY).unwrap().id;
        document
            .add_item(id, RetroCategory::WentWell, "Fast reviews")
            .unwrap();
        document
            .add_item(id, RetroCategory::ToImprove, "Flaky CI")
            .unwrap();
        document
            .add_item(id, RetroCategory::WentWell, "Pairing")
            .unwrap();
        document.vote(id, 3).unwrap();
        assert_eq!(document.vote(id, 3).unwrap(), 2);

        let retro = document.get(id).unwrap();
        let sections = retro.sections();
        assert_eq!(sections[0].category, RetroCategory::WentWell);
        assert_eq!(
            sections[0]
                .items
                .iter()
                .map(|(number, _)| *number)
                .collect::<Vec<_>>(),
            vec![3, 1]
        );
        assert_eq!(sections[1].items.len(), 1);
        assert!(sections[2].items.is_empty());
    }

    #[test]
    fn test_item_numbers_are_checked() {
        let mut document = RetrosDocument::default();
        let id = document.create("Sprint 12", DAY).unwrap().id;
        assert!(document.vote(id, 1).is_err());
        document.add_item(id, RetroCategory::Action, "Fix CI").unwrap();
        assert!(document.vote(id, 0).is_err());
        assert_eq!(document.remove_item(id, 1).unwrap().text, "Fix CI");
        assert!(document.remove_item(id, 1).is_err());
        assert!(document.add_item(id, RetroCategory::Action, " ").is_err());
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!(
            RetroCategory::from_str("good", true).unwrap(),
            RetroCategory::WentWell
        );
        assert_eq!(
            RetroCategory::from_str("to-improve", true).unwrap(),
            RetroCategory::ToImprove
        );
    }

    #[test]
    fn test_remove_and_listing() {
        let mut document = RetrosDocument::default();
        document.create("Old", DAY.pred_opt().unwrap()).unwrap();
        document.create("New", DAY).unwrap();
        assert_eq!(document.listing()[0].title, "New");
        document.remove(1).unwrap();
        assert!(document.get(1).is_err());
    }
}
