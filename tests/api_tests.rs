//! Tests for the JSON API client against a mock merge server.

use std::time::Duration;

use serde_json::json;
use tidal_merger::api::{AuthState, ContentType};
use tidal_merger::{ApiClient, AppError, Config, Resolved, ServerLimits};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let mut config = Config::new(&server.uri()).unwrap();
    config.poll_interval = Duration::from_millis(10);
    ApiClient::new(&config).unwrap()
}

fn playlist_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "trackCount": 12,
        "coverUrl": null,
        "fallbackCovers": ["https://img/1.jpg", "https://img/2.jpg"]
    })
}

// =============================================================================
// Resolution
// =============================================================================

mod resolution {
    use super::*;

    #[tokio::test]
    async fn test_resolve_playlist_sends_trimmed_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/playlist/resolve"))
            .and(body_json(json!({"url": "https://listen.tidal.com/playlist/abc123-def456"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(playlist_json("abc123-def456", "Road Trip")))
            .expect(1)
            .mount(&server)
            .await;

        let content = client_for(&server)
            .resolve_playlist("  https://listen.tidal.com/playlist/abc123-def456 ")
            .await
            .unwrap();

        assert_eq!(content.id, "abc123-def456");
        assert_eq!(content.content_type, ContentType::Playlist);
        assert_eq!(content.track_count, Some(12));
    }

    #[tokio::test]
    async fn test_invalid_playlist_input_never_reaches_server() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);

        match client.resolve_playlist("https://example.com/playlist/123").await {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Please check the URL format"),
            other => panic!("Expected validation error, got {:?}", other),
        }
        match client.resolve_playlist("   ").await {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Please enter a playlist URL or ID"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_detail_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/playlist/resolve"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid playlist URL format"})),
            )
            .mount(&server)
            .await;

        let result = client_for(&server)
            .resolve_playlist("abc123-def456-ghi789-jkl012")
            .await;

        match result {
            Err(AppError::Server { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid playlist URL format");
            }
            other => panic!("Expected server error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_content_album() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/content/resolve"))
            .and(body_json(json!({"input": "123456789"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "123456789",
                "name": "Discovery",
                "trackCount": 14,
                "coverUrl": "https://img/discovery.jpg",
                "fallbackCovers": [],
                "contentType": "album",
                "artist": "Daft Punk",
                "year": 2001
            })))
            .mount(&server)
            .await;

        match client_for(&server).resolve_content("123456789").await.unwrap() {
            Resolved::Content(content) => {
                assert_eq!(content.content_type, ContentType::Album);
                assert_eq!(content.artist.as_deref(), Some("Daft Punk"));
            }
            other => panic!("Expected content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_source_sends_hyphenated_id_to_playlist_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/playlist/resolve"))
            .and(body_json(json!({"url": "abc123-def456-ghi789-jkl012"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(playlist_json("abc123-def456-ghi789-jkl012", "Opaque")),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/api/content/resolve"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let content = client_for(&server)
            .resolve_source(" abc123-def456-ghi789-jkl012 ")
            .await
            .unwrap();
        assert_eq!(content.name, "Opaque");
    }

    #[tokio::test]
    async fn test_resolve_source_routes_album_links_through_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/content/resolve"))
            .and(body_json(json!({"input": "https://tidal.com/browse/album/987654"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "987654",
                "name": "Some Album",
                "contentType": "album"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = client_for(&server)
            .resolve_source("https://tidal.com/browse/album/987654")
            .await
            .unwrap();
        assert_eq!(content.content_type, ContentType::Album);
    }

    #[tokio::test]
    async fn test_resolve_source_refuses_text_and_tracks_locally() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(matches!(
            client.resolve_source("chill vibes").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            client.resolve_source("https://listen.tidal.com/track/12345").await,
            Err(AppError::Validation(_))
        ));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_resolve_content_falls_back_to_search() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/content/resolve"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "search",
                "results": [playlist_json("p1", "Chill"), playlist_json("p2", "Chill 2")],
                "total": 31,
                "hasMore": true
            })))
            .mount(&server)
            .await;

        match client_for(&server).resolve_content("chill").await.unwrap() {
            Resolved::Search(page) => {
                assert_eq!(page.results.len(), 2);
                assert_eq!(page.total, 31);
                assert!(page.has_more);
            }
            other => panic!("Expected search results, got {:?}", other),
        }
    }
}

// =============================================================================
// Browsing
// =============================================================================

mod browsing {
    use super::*;

    #[tokio::test]
    async fn test_search_sends_page_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/search"))
            .and(body_json(json!({"query": "jazz", "limit": 10, "offset": 20})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [playlist_json("p1", "Jazz Classics")],
                "total": 21,
                "hasMore": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server).search(" jazz ", 20).await.unwrap();
        assert_eq!(page.results[0].name, "Jazz Classics");
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_blank_search_is_local_error() {
        let server = MockServer::start().await;
        let result = client_for(&server).search("  ", 0).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_my_playlists_with_favorites() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/me/playlists"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "playlists": [playlist_json("p1", "Mine")],
                "favorites": {
                    "id": "favorites",
                    "name": "My Tracks",
                    "trackCount": 321,
                    "coverUrl": null,
                    "fallbackCovers": [],
                    "contentType": "favorites"
                }
            })))
            .mount(&server)
            .await;

        let mine = client_for(&server).my_playlists().await.unwrap();
        assert_eq!(mine.playlists.len(), 1);
        let favorites = mine.favorites.unwrap();
        assert_eq!(favorites.content_type, ContentType::Favorites);
        assert_eq!(favorites.track_count, Some(321));
    }

    #[tokio::test]
    async fn test_server_limits() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"trackLimit": 5000, "maxPlaylists": 50})),
            )
            .mount(&server)
            .await;

        let limits = client_for(&server).server_limits().await.unwrap();
        assert_eq!(limits.track_limit, 5000);
        assert_eq!(limits.max_playlists, 50);
    }

    #[tokio::test]
    async fn test_server_limits_fall_back_to_defaults() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let limits = client_for(&server).server_limits_or_default().await;
        assert_eq!(limits, ServerLimits::default());
    }
}

// =============================================================================
// Authentication
// =============================================================================

mod auth {
    use super::*;

    #[tokio::test]
    async fn test_login_returns_link_and_code() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "login_url": "https://link.tidal.com/ABCDE",
                "user_code": "ABCDE",
                "pending": false
            })))
            .mount(&server)
            .await;

        let login = client_for(&server).login().await.unwrap();
        assert_eq!(login.login_url, "https://link.tidal.com/ABCDE");
        assert_eq!(login.user_code.as_deref(), Some("ABCDE"));
    }

    #[tokio::test]
    async fn test_wait_for_login_completes_via_check() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"authenticated": false})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/auth/check"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"completed": true, "authenticated": true})),
            )
            .mount(&server)
            .await;

        client_for(&server)
            .wait_for_login(Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_login_gives_up() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"authenticated": false})))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/auth/check"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"completed": false, "authenticated": false})),
            )
            .mount(&server)
            .await;

        let result = client_for(&server)
            .wait_for_login(Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(AppError::Auth(_))));
    }

    #[tokio::test]
    async fn test_auth_state() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"authenticated": true})))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).auth_state().await, AuthState::Authenticated);

        let unreachable = ApiClient::new(&Config::new("http://127.0.0.1:1").unwrap()).unwrap();
        assert_eq!(unreachable.auth_state().await, AuthState::Unreachable);
    }

    #[tokio::test]
    async fn test_logout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/logout"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).logout().await.unwrap();
    }
}
