use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::TrackerError, storage::document_store::Document};

use super::allocate_id;

#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarksDocument {
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default = "first_id")]
    pub next_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for BookmarksDocument {
    fn default() -> Self {
        Self {
            bookmarks: vec![],
            next_id: first_id(),
        }
    }
}

impl Document for BookmarksDocument {
    const FILE_NAME: &'static str = "bookmarks.json";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u64,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
}

const KIND: &str = "Bookmark";

/// Parses and normalizes a bookmark address. Only http and https are accepted, a missing scheme
/// means https.
pub fn normalize_url(input: &str) -> Result<Url, TrackerError> {
    let input = input.trim();
    let parsed = match Url::parse(input) {
        Ok(v) => v,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{input}"))
            .map_err(|e| TrackerError::invalid("url", format!("`{input}`: {e}")))?,
        Err(e) => return Err(TrackerError::invalid("url", format!("`{input}`: {e}"))),
    };
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(TrackerError::invalid(
            "url",
            format!("`{input}` is not a web address"),
        ));
    }
    Ok(parsed)
}

/// Same address regardless of scheme and trailing slash. [Url] already lowercases the host,
/// paths and queries stay case sensitive.
fn comparable(url: &str) -> String {
    let Ok(url) = Url::parse(url) else {
        return url.trim_end_matches('/').to_string();
    };
    let mut key = url.host_str().unwrap_or_default().to_string();
    if let Some(port) = url.port() {
        key.push_str(&format!(":{port}"));
    }
    key.push_str(url.path().trim_end_matches('/'));
    if let Some(query) = url.query() {
        key.push('?');
        key.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        key.push('#');
        key.push_str(fragment);
    }
    key
}

fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().trim_start_matches('#').to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

fn merge_tags(existing: &mut Vec<String>, tags: &[String]) {
    existing.extend(tags.iter().filter_map(|v| normalize_tag(v)));
    existing.sort();
    existing.dedup();
}

impl BookmarksDocument {
    pub fn get(&self, id: u64) -> Result<&Bookmark, TrackerError> {
        self.bookmarks
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Bookmark, TrackerError> {
        self.bookmarks
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))
    }

    pub fn add(
        &mut self,
        url: &str,
        title: Option<&str>,
        tags: &[String],
        now: DateTime<Utc>,
    ) -> Result<&Bookmark, TrackerError> {
        let url = normalize_url(url)?;
        let key = comparable(url.as_str());
        if let Some(existing) = self.bookmarks.iter().find(|v| comparable(&v.url) == key) {
            return Err(TrackerError::duplicate(
                KIND,
                format!("{} (#{})", existing.url, existing.id),
            ));
        }

        let title = title
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| url.host_str().unwrap_or_default().to_string());
        let mut bookmark_tags = vec![];
        merge_tags(&mut bookmark_tags, tags);

        let id = allocate_id(&mut self.next_id, self.bookmarks.iter().map(|v| v.id));
        self.bookmarks.push(Bookmark {
            id,
            url: url.to_string(),
            title,
            tags: bookmark_tags,
            created: now,
        });
        Ok(&self.bookmarks[self.bookmarks.len() - 1])
    }

    pub fn remove(&mut self, id: u64) -> Result<Bookmark, TrackerError> {
        let position = self
            .bookmarks
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| TrackerError::not_found(KIND, id))?;
        Ok(self.bookmarks.remove(position))
    }

    pub fn retitle(&mut self, id: u64, title: &str) -> Result<(), TrackerError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TrackerError::invalid("title", "title can't be empty"));
        }
        self.get_mut(id)?.title = title.to_string();
        Ok(())
    }

    pub fn tag(&mut self, id: u64, tags: &[String]) -> Result<&Bookmark, TrackerError> {
        let bookmark = self.get_mut(id)?;
        merge_tags(&mut bookmark.tags, tags);
        Ok(&*bookmark)
    }

    pub fn untag(&mut self, id: u64, tags: &[String]) -> Result<&Bookmark, TrackerError> {
        let removed = tags
            .iter()
            .filter_map(|v| normalize_tag(v))
            .collect::<Vec<_>>();
        let bookmark = self.get_mut(id)?;
        bookmark.tags.retain(|v| !removed.contains(v));
        Ok(&*bookmark)
    }

    pub fn with_tag(&self, tag: Option<&str>) -> Vec<&Bookmark> {
        let tag = tag.and_then(normalize_tag);
        self.bookmarks
            .iter()
            .filter(|v| tag.as_ref().map_or(true, |tag| v.tags.contains(tag)))
            .collect()
    }

    /// Case-insensitive match over title, address and tags.
    pub fn search(&self, query: &str) -> Vec<&Bookmark> {
        let query = query.trim().to_lowercase();
        self.bookmarks
            .iter()
            .filter(|v| {
                v.title.to_lowercase().contains(&query)
                    || v.url.to_lowercase().contains(&query)
                    || v.tags.iter().any(|tag| tag.contains(&query))
            })
            .collect()
    }

    /// Tag usage counts.
    pub fn tag_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for tag in self.bookmarks.iter().flat_map(|v| v.tags.iter()) {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
        counts
    }
}
