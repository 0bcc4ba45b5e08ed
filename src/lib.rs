pub mod api;
pub mod config;
pub mod error;
pub mod identifier;
pub mod merge;
pub mod workspace;

pub use api::{ApiClient, Content, ContentType, MergeResult, Resolved};
pub use config::{Config, ServerLimits};
pub use error::{AppError, Result};
pub use identifier::{ContentInput, LinkKind, classify_content, validate_playlist_input};
pub use merge::{MergeClient, MergeEvent, MergeProgress, MergeRequest, MergeStream};
pub use workspace::Workspace;
