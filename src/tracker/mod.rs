//! Data model of the tracking tools. Every document is a plain serde type, commands load and
//! mutate them through [crate::storage::document_store::DocumentStore].

pub mod bookmarks;
pub mod checklists;
pub mod habits;
pub mod journal;
pub mod meetings;
pub mod retro;
pub mod streak;
pub mod tasks;
pub mod timelog;

/// Hands out the next id of a document. `next_id` only grows, so ids of removed entries are never
/// given out again. Entries added by hand with higher ids push it forward.
pub(crate) fn allocate_id(next_id: &mut u64, ids: impl Iterator<Item = u64>) -> u64 {
    let id = ids.map(|v| v + 1).max().unwrap_or(1).max(*next_id);
    *next_id = id + 1;
    id
}
