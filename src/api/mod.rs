pub mod client;
pub mod models;

pub use client::{ApiClient, SEARCH_PAGE_SIZE};
pub use models::{
    AuthCheck, AuthState, AuthStatus, Content, ContentType, Cover, DuplicateKind, DuplicateTrack,
    LoginResponse, MergeResult, Resolved, SearchPage, UserPlaylists,
};
