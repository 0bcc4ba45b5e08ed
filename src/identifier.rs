use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};

pub const EMPTY_INPUT_ERROR: &str = "Please enter a playlist URL or ID";
pub const BAD_FORMAT_ERROR: &str = "Please check the URL format";

const UUID: &str = r"[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}";

/// Playlist shapes accepted by the submit gate, tried in order. Each pattern
/// captures the playlist id in group 1.
static PLAYLIST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)listen\.tidal\.com/playlist/([a-zA-Z0-9-]+)".to_string(),
        r"(?i)tidal\.com/.*playlist/([a-zA-Z0-9-]+)".to_string(),
        format!(r"(?i)^({})$", UUID),
        r"^([a-zA-Z0-9-]{20,})$".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("playlist pattern is valid"))
    .collect()
});

static LINK_PATTERNS: LazyLock<Vec<(LinkKind, Regex)>> = LazyLock::new(|| {
    let mut patterns = Vec::new();
    for kind in [LinkKind::Playlist, LinkKind::Album, LinkKind::Mix, LinkKind::Track] {
        let id = kind.id_pattern();
        for host in [r"listen\.tidal\.com/", r"tidal\.com/(?:browse/)?"] {
            let pattern = format!(r"(?i){}{}/({})", host, kind.path_segment(), id);
            patterns.push((kind, Regex::new(&pattern).expect("link pattern is valid")));
        }
    }
    patterns
});

static RAW_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        format!(r"(?i)^{}$", UUID),
        r"^\d{6,}$".to_string(),
        r"^[a-zA-Z0-9]{20,}$".to_string(),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("raw id pattern is valid"))
    .collect()
});

/// Outcome of [`validate_playlist_input`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub error: Option<String>,
}

impl Validation {
    fn ok() -> Self {
        Self { valid: true, error: None }
    }

    fn invalid(error: &str) -> Self {
        Self {
            valid: false,
            error: Some(error.to_string()),
        }
    }

    pub fn into_result(self) -> Result<()> {
        match self.error {
            Some(error) if !self.valid => Err(AppError::Validation(error)),
            _ => Ok(()),
        }
    }
}

/// Decide whether free text looks like a playlist URL or id. Pure and total;
/// the only normalization is trimming.
pub fn validate_playlist_input(input: &str) -> Validation {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Validation::invalid(EMPTY_INPUT_ERROR);
    }

    if PLAYLIST_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
        Validation::ok()
    } else {
        Validation::invalid(BAD_FORMAT_ERROR)
    }
}

/// Pull the playlist id out of a URL or raw id.
pub fn extract_playlist_id(input: &str) -> Result<String> {
    let trimmed = input.trim();

    PLAYLIST_PATTERNS
        .iter()
        .find_map(|p| p.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AppError::validation("Invalid playlist URL format"))
}

/// Path kinds recognized in Tidal web links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Playlist,
    Album,
    Mix,
    Track,
}

impl LinkKind {
    fn path_segment(self) -> &'static str {
        match self {
            LinkKind::Playlist => "playlist",
            LinkKind::Album => "album",
            LinkKind::Mix => "mix",
            LinkKind::Track => "track",
        }
    }

    fn id_pattern(self) -> &'static str {
        match self {
            LinkKind::Album | LinkKind::Track => r"\d+",
            LinkKind::Playlist | LinkKind::Mix => r"[a-zA-Z0-9-]+",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// Three-way classification of free text typed into the add box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentInput {
    /// A recognized web link; the id and kind are taken from the path.
    Url { id: String, kind: LinkKind },
    /// A bare id whose kind the server has to work out.
    Id(String),
    /// Anything else, handed to the server-side search.
    Search(String),
}

impl ContentInput {
    pub fn is_direct(&self) -> bool {
        !matches!(self, ContentInput::Search(_))
    }
}

pub fn classify_content(input: &str) -> ContentInput {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return ContentInput::Search(String::new());
    }

    for (kind, pattern) in LINK_PATTERNS.iter() {
        if let Some(id) = pattern.captures(trimmed).and_then(|caps| caps.get(1)) {
            return ContentInput::Url {
                id: id.as_str().to_string(),
                kind: *kind,
            };
        }
    }

    if RAW_ID_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
        return ContentInput::Id(trimmed.to_string());
    }

    ContentInput::Search(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_tidal_url_is_valid() {
        let result = validate_playlist_input("https://listen.tidal.com/playlist/abc123-def456");
        assert!(result.valid);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_browse_url_is_valid() {
        assert!(validate_playlist_input("https://tidal.com/browse/playlist/abc123-def456").valid);
    }

    #[test]
    fn test_raw_uuid_is_valid() {
        assert!(validate_playlist_input("ABC123DE-F456-7890-ABCD-EF1234567890").valid);
    }

    #[test]
    fn test_long_opaque_id_is_valid() {
        assert!(validate_playlist_input("abc123-def456-ghi789-jkl012").valid);
    }

    #[test]
    fn test_foreign_host_gets_format_error() {
        let result = validate_playlist_input("https://example.com/playlist/123");
        assert!(!result.valid);
        assert_eq!(result.error.as_deref(), Some(BAD_FORMAT_ERROR));
    }

    #[test]
    fn test_short_token_gets_format_error() {
        let result = validate_playlist_input("abc123");
        assert_eq!(result.error.as_deref(), Some(BAD_FORMAT_ERROR));
    }

    #[test]
    fn test_empty_and_blank_input() {
        for input in ["", "   ", "\t\n"] {
            let result = validate_playlist_input(input);
            assert!(!result.valid);
            assert_eq!(result.error.as_deref(), Some(EMPTY_INPUT_ERROR));
        }
    }

    #[test]
    fn test_validation_into_result() {
        assert!(validate_playlist_input("abc123-def456-ghi789-jkl012").into_result().is_ok());
        match validate_playlist_input("").into_result() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, EMPTY_INPUT_ERROR),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_id_from_urls_and_raw_ids() {
        assert_eq!(
            extract_playlist_id("  https://listen.tidal.com/playlist/abc123  ").unwrap(),
            "abc123"
        );
        assert_eq!(
            extract_playlist_id("https://tidal.com/playlist/abc123-def456").unwrap(),
            "abc123-def456"
        );
        assert_eq!(
            extract_playlist_id("abc123de-f456-7890-abcd-ef1234567890").unwrap(),
            "abc123de-f456-7890-abcd-ef1234567890"
        );
        assert!(extract_playlist_id("https://example.com/playlist/123").is_err());
    }

    #[test]
    fn test_classify_links_by_kind() {
        assert_eq!(
            classify_content("https://tidal.com/browse/album/123456789"),
            ContentInput::Url {
                id: "123456789".to_string(),
                kind: LinkKind::Album
            }
        );
        assert_eq!(
            classify_content("https://listen.tidal.com/mix/0011223344aabbccdd"),
            ContentInput::Url {
                id: "0011223344aabbccdd".to_string(),
                kind: LinkKind::Mix
            }
        );
        assert_eq!(
            classify_content("https://tidal.com/track/42"),
            ContentInput::Url {
                id: "42".to_string(),
                kind: LinkKind::Track
            }
        );
    }

    #[test]
    fn test_classify_raw_ids() {
        assert_eq!(classify_content("1234567"), ContentInput::Id("1234567".to_string()));
        assert_eq!(
            classify_content("abc123de-f456-7890-abcd-ef1234567890"),
            ContentInput::Id("abc123de-f456-7890-abcd-ef1234567890".to_string())
        );
        assert_eq!(
            classify_content("000123456789abcdefABCDEF"),
            ContentInput::Id("000123456789abcdefABCDEF".to_string())
        );
    }

    #[test]
    fn test_classify_free_text_as_search() {
        let input = classify_content("  daft punk discovery ");
        assert_eq!(input, ContentInput::Search("daft punk discovery".to_string()));
        assert!(!input.is_direct());

        // Artist pages are not addable, so they fall through to search.
        assert!(matches!(
            classify_content("https://tidal.com/browse/artist/1566"),
            ContentInput::Search(_)
        ));
    }
}
