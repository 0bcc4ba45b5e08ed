use std::collections::HashSet;

use tracing::debug;

use crate::api::models::Content;
use crate::error::{AppError, Result};
use crate::merge::MergeRequest;

pub const ALREADY_ADDED: &str = "Playlist already added";

/// The collections a user has gathered, plus which of them are ticked for
/// merging. Every selected id refers to an entry in the working set.
#[derive(Debug, Clone)]
pub struct Workspace {
    items: Vec<Content>,
    selected: HashSet<String>,
    max_items: usize,
}

impl Workspace {
    pub fn new(max_items: usize) -> Self {
        Self {
            items: Vec::new(),
            selected: HashSet::new(),
            max_items,
        }
    }

    pub fn items(&self) -> &[Content] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.max_items
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|c| c.id == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Add a new entry at the front and select it. Duplicates are refused,
    /// never replaced.
    pub fn add(&mut self, content: Content) -> Result<()> {
        self.insert_at(0, content)
    }

    /// Like [`add`](Self::add) but keeps arrival order, for batch input where
    /// the caller's order is the merge precedence.
    pub fn append(&mut self, content: Content) -> Result<()> {
        self.insert_at(self.items.len(), content)
    }

    fn insert_at(&mut self, index: usize, content: Content) -> Result<()> {
        if self.contains(&content.id) {
            return Err(AppError::validation(ALREADY_ADDED));
        }
        if self.is_full() {
            return Err(AppError::Validation(format!(
                "Maximum {} items reached",
                self.max_items
            )));
        }

        debug!(id = %content.id, "Adding {} to workspace", content.name);
        self.selected.insert(content.id.clone());
        self.items.insert(index, content);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Content> {
        let pos = self.items.iter().position(|c| c.id == id)?;
        self.selected.remove(id);
        Some(self.items.remove(pos))
    }

    /// Flip the selection of an entry. Returns the new state, or `None` for
    /// an id that is not in the working set.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        if !self.contains(id) {
            return None;
        }
        if self.selected.remove(id) {
            Some(false)
        } else {
            self.selected.insert(id.to_string());
            Some(true)
        }
    }

    /// Move an entry to a new position. Selection is unaffected.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        if from >= self.items.len() || to >= self.items.len() {
            return false;
        }
        let item = self.items.remove(from);
        self.items.insert(to, item);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected.clear();
    }

    /// Selected ids in working-set order, which is the merge precedence.
    pub fn selected_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|c| self.selected.contains(&c.id))
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn selected_track_total(&self) -> u32 {
        self.items
            .iter()
            .filter(|c| self.selected.contains(&c.id))
            .filter_map(|c| c.track_count)
            .sum()
    }

    pub fn merge_request(&self, name: &str, deep_clean: bool) -> Result<MergeRequest> {
        MergeRequest::new(self.selected_ids(), name, deep_clean)
    }
}

/// Case-insensitive name filter used when browsing the user's own playlists.
pub fn filter_by_name<'a>(items: &'a [Content], query: &str) -> Vec<&'a Content> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&query))
        .collect()
}
