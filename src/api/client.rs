use std::time::{Duration, Instant};

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::models::{
    AuthCheck, AuthState, AuthStatus, Content, LoginResponse, Resolved, SearchPage, UserPlaylists,
};
use crate::config::{Config, ServerLimits};
use crate::error::{AppError, Result};
use crate::identifier::{
    ContentInput, LinkKind, classify_content, extract_playlist_id, validate_playlist_input,
};

pub const SEARCH_PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Turn a non-2xx response into `AppError::Server`, preferring the server's
/// `detail` message over the raw body.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body).ok().and_then(|b| b.detail) {
        Some(serde_json::Value::String(detail)) => detail,
        Some(other) => other.to_string(),
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string(),
        None => body,
    };

    Err(AppError::Server {
        status: status.as_u16(),
        message,
    })
}

/// JSON client for every server endpoint except the merge stream.
pub struct ApiClient {
    http_client: Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn health(&self) -> bool {
        match self.http_client.get(self.config.endpoint("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }

    pub async fn auth_status(&self) -> Result<AuthStatus> {
        let response = self
            .http_client
            .get(self.config.endpoint("/auth/status"))
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn auth_state(&self) -> AuthState {
        match self.auth_status().await {
            Ok(status) if status.authenticated => AuthState::Authenticated,
            Ok(_) => AuthState::LoggedOut,
            Err(e) => {
                warn!("Unable to reach the merge server: {}", e);
                AuthState::Unreachable
            }
        }
    }

    /// Start the device login. The server returns the link to open and, for a
    /// fresh login, the code to enter there.
    pub async fn login(&self) -> Result<LoginResponse> {
        let response = self
            .http_client
            .get(self.config.endpoint("/auth/login"))
            .send()
            .await?;

        let login: LoginResponse = ensure_success(response)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to start login: {}", e)))?
            .json()
            .await?;

        info!(pending = login.pending, "Login initiated");
        Ok(login)
    }

    pub async fn check_login(&self) -> Result<AuthCheck> {
        let response = self
            .http_client
            .get(self.config.endpoint("/auth/check"))
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn logout(&self) -> Result<()> {
        let response = self
            .http_client
            .post(self.config.endpoint("/auth/logout"))
            .send()
            .await?;

        ensure_success(response).await?;
        info!("Logged out");
        Ok(())
    }

    /// Poll until the user has approved the device login, or `max_wait`
    /// elapses. Errors while polling are logged and polling continues.
    pub async fn wait_for_login(&self, max_wait: Duration) -> Result<()> {
        let start = Instant::now();

        loop {
            if start.elapsed() > max_wait {
                return Err(AppError::Auth("Login was not completed in time".into()));
            }

            tokio::time::sleep(self.config.poll_interval).await;

            match self.auth_status().await {
                Ok(status) if status.authenticated => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Auth status check failed while polling: {}", e);
                    continue;
                }
            }

            match self.check_login().await {
                Ok(check) if check.completed && check.authenticated => break,
                Ok(_) => debug!("Login still pending"),
                Err(e) => warn!("Login check failed while polling: {}", e),
            }
        }

        info!("Successfully authenticated with Tidal");
        Ok(())
    }

    pub async fn server_limits(&self) -> Result<ServerLimits> {
        let response = self
            .http_client
            .get(self.config.endpoint("/api/config"))
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    /// Like [`server_limits`](Self::server_limits) but falls back to the
    /// built-in defaults when the server cannot be asked.
    pub async fn server_limits_or_default(&self) -> ServerLimits {
        match self.server_limits().await {
            Ok(limits) => limits,
            Err(e) => {
                warn!("Could not load server limits, using defaults: {}", e);
                ServerLimits::default()
            }
        }
    }

    /// Resolve a playlist URL or id. The input is checked locally first, so
    /// malformed input never reaches the network.
    pub async fn resolve_playlist(&self, input: &str) -> Result<Content> {
        validate_playlist_input(input).into_result()?;

        let response = self
            .http_client
            .post(self.config.endpoint("/api/playlist/resolve"))
            .json(&json!({ "url": input.trim() }))
            .send()
            .await?;

        let content: Content = ensure_success(response).await?.json().await?;
        debug!(id = %content.id, "Resolved playlist {}", content.name);
        Ok(content)
    }

    pub async fn resolve_content(&self, input: &str) -> Result<Resolved> {
        let response = self
            .http_client
            .post(self.config.endpoint("/api/content/resolve"))
            .json(&json!({ "input": input.trim() }))
            .send()
            .await?;

        let value: serde_json::Value = ensure_success(response).await?.json().await?;

        if value.get("type").and_then(|t| t.as_str()) == Some("search") {
            let page: SearchPage = serde_json::from_value(value)?;
            debug!(total = page.total, "Resolve fell back to search");
            return Ok(Resolved::Search(page));
        }

        let content: Content = serde_json::from_value(value)?;
        debug!(id = %content.id, kind = %content.content_type, "Resolved {}", content.name);
        Ok(Resolved::Content(content))
    }

    /// Look up one merge source. Playlist links, and anything the playlist
    /// gate accepts, go through the playlist endpoint; other links and ids
    /// are typed by the server. Free text and track links are refused.
    pub async fn resolve_source(&self, input: &str) -> Result<Content> {
        match classify_content(input) {
            ContentInput::Url {
                kind: LinkKind::Track,
                ..
            } => Err(AppError::validation(
                "Single tracks cannot be merged, only playlists, albums and mixes",
            )),
            ContentInput::Url {
                kind: LinkKind::Playlist,
                ..
            } => self.resolve_playlist(input).await,
            ContentInput::Search(_) if validate_playlist_input(input).valid => {
                let id = extract_playlist_id(input)?;
                debug!(id = %id, "Treating input as a playlist id");
                self.resolve_playlist(input).await
            }
            ContentInput::Search(_) => Err(AppError::Validation(format!(
                "\"{}\" is not a URL or ID; search for it instead",
                input.trim()
            ))),
            ContentInput::Url { .. } | ContentInput::Id(_) => {
                match self.resolve_content(input).await? {
                    Resolved::Content(content) => Ok(content),
                    Resolved::Search(_) => Err(AppError::Validation(format!(
                        "\"{}\" matches more than one item; search for it instead",
                        input.trim()
                    ))),
                }
            }
        }
    }

    pub async fn search(&self, query: &str, offset: usize) -> Result<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("Please enter something to search for"));
        }

        let response = self
            .http_client
            .post(self.config.endpoint("/api/search"))
            .json(&json!({
                "query": query,
                "limit": SEARCH_PAGE_SIZE,
                "offset": offset,
            }))
            .send()
            .await?;

        let page: SearchPage = ensure_success(response).await?.json().await?;
        debug!(
            query,
            offset,
            returned = page.results.len(),
            total = page.total,
            "Search page loaded"
        );
        Ok(page)
    }

    pub async fn my_playlists(&self) -> Result<UserPlaylists> {
        let response = self
            .http_client
            .get(self.config.endpoint("/api/me/playlists"))
            .send()
            .await?;

        let playlists: UserPlaylists = ensure_success(response).await?.json().await?;
        info!("Found {} user playlists", playlists.playlists.len());
        Ok(playlists)
    }
}
