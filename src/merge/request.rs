use std::collections::HashSet;

use serde::Serialize;

use crate::error::{AppError, Result};

pub const MIN_SOURCES: usize = 2;

pub const TOO_FEW_SOURCES: &str = "Please select at least 2 playlists to merge.";
pub const MISSING_NAME: &str = "Please enter a name for your new merged playlist.";

/// A validated merge command. Source order is insertion precedence: when the
/// same track appears in several sources, the earliest source keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    playlist_ids: Vec<String>,
    name: String,
    keep_it_tidy: bool,
}

impl MergeRequest {
    pub fn new<I, S>(playlist_ids: I, name: &str, deep_clean: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let playlist_ids: Vec<String> = playlist_ids.into_iter().map(Into::into).collect();

        if playlist_ids.len() < MIN_SOURCES {
            return Err(AppError::validation(TOO_FEW_SOURCES));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = playlist_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(AppError::Validation(format!(
                "Playlist {} is selected more than once",
                dup
            )));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation(MISSING_NAME));
        }

        Ok(Self {
            playlist_ids,
            name: name.to_string(),
            keep_it_tidy: deep_clean,
        })
    }

    pub fn playlist_ids(&self) -> &[String] {
        &self.playlist_ids
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether repeats inside a single source are removed too.
    pub fn deep_clean(&self) -> bool {
        self.keep_it_tidy
    }
}
