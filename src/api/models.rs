use serde::{Deserialize, Deserializer, Serialize};

pub const MAX_COVER_TILES: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Playlist,
    Album,
    Mix,
    Favorites,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Playlist => write!(f, "Playlist"),
            ContentType::Album => write!(f, "Album"),
            ContentType::Mix => write!(f, "Mix"),
            ContentType::Favorites => write!(f, "Favorites"),
        }
    }
}

/// A playlist, album, mix or favorites collection the server resolved.
/// Older server builds omit `contentType` for playlists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub track_count: Option<u32>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub fallback_covers: Vec<String>,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cover {
    Single(String),
    Mosaic(Vec<String>),
    Placeholder,
}

impl Content {
    pub fn cover(&self) -> Cover {
        if let Some(url) = self.cover_url.as_ref().filter(|u| !u.is_empty()) {
            return Cover::Single(url.clone());
        }

        let tiles: Vec<String> = self
            .fallback_covers
            .iter()
            .filter(|u| !u.is_empty())
            .take(MAX_COVER_TILES)
            .cloned()
            .collect();

        if tiles.is_empty() {
            Cover::Placeholder
        } else {
            Cover::Mosaic(tiles)
        }
    }

    pub fn track_count_label(&self) -> String {
        match self.track_count {
            Some(1) => "1 track".to_string(),
            Some(n) => format!("{} tracks", n),
            None => "? tracks".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub results: Vec<Content>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub has_more: bool,
}

/// What `/api/content/resolve` hands back: the content itself, or search
/// results when the input was ambiguous.
#[derive(Debug, Clone)]
pub enum Resolved {
    Content(Content),
    Search(SearchPage),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPlaylists {
    #[serde(default)]
    pub playlists: Vec<Content>,
    #[serde(default)]
    pub favorites: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub login_url: String,
    #[serde(default)]
    pub user_code: Option<String>,
    #[serde(default)]
    pub pending: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AuthCheck {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub authenticated: bool,
}

/// Login state as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    LoggedOut,
    Authenticated,
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKind {
    Cross,
    Intra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateTrack {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub artist: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub appeared_in: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<DuplicateKind>,
}

/// `appearedIn` arrives either as a list of source names or a single name.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(name)) => vec![name],
        Some(OneOrMany::Many(names)) => names,
        None => Vec::new(),
    })
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeResult {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub track_count: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub total_fetched: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub duplicates_removed: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub cross_playlist_duplicates: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub intra_playlist_duplicates: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub playlist_counts: Vec<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub duplicates: Vec<DuplicateTrack>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_duplicate_tracks: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub was_truncated: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub truncated_count: u32,
}

#[cfg(test)]
impl Content {
    pub fn mock(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            track_count: Some(25),
            cover_url: None,
            fallback_covers: Vec::new(),
            content_type: ContentType::Playlist,
            artist: None,
            description: None,
            year: None,
        }
    }
}
