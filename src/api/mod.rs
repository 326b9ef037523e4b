//! Pollify REST API
//!
//! HTTP API layer for Pollify, built with Axum.
//!
//! # Endpoints
//!
//! ## Auth
//! - `POST /api/v1/auth/signup` - Create an account (201, sets session cookie)
//! - `POST /api/v1/auth/login` - Sign in
//! - `POST /api/v1/auth/logout` - Revoke the session
//! - `GET /api/v1/auth/session` - Current user
//!
//! ## Polls
//! - `POST /api/v1/polls` - Create a poll
//! - `GET /api/v1/polls/mine` - The caller's polls
//! - `GET /api/v1/polls/:id` - One poll, with the caller's vote
//! - `DELETE /api/v1/polls/:id` - Delete (creator only)
//! - `POST /api/v1/polls/:id/votes` - Vote, once per voter address
//!
//! ## Discovery
//! - `GET /api/v1/feed` - Public polls, newest first
//! - `GET /api/v1/stats` - Aggregate counts
//! - `GET /api/v1/whoami` - Resolved voter address
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Live poll updates
//!
//! # Example
//!
//! ```rust,no_run
//! use pollify::api::{serve, AppState};
//! use pollify::config::Config;
//! use pollify::store::{Store, StoreConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(Store::open(&StoreConfig::new(&config.storage.data_dir))?);
//!
//!     let state = AppState::new(store, config)?;
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ApiQuery};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::store::Store;
use crate::websocket::{websocket_handler, ConnectionHub, WsEvent};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Auth routes
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/session", get(routes::auth::current_session))
        // Poll routes
        .route("/polls", post(routes::polls::create_poll))
        .route("/polls/mine", get(routes::polls::my_polls))
        .route(
            "/polls/:id",
            get(routes::polls::get_poll).delete(routes::polls::delete_poll),
        )
        .route("/polls/:id/votes", post(routes::votes::cast_vote))
        // Discovery routes
        .route("/feed", get(routes::feed::public_feed))
        .route("/stats", get(routes::stats::stats))
        .route("/whoami", get(routes::stats::whoami))
        .layer(DefaultBodyLimit::max(state.config.api.max_body_size))
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.api.cors_origins);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive when no origins are configured; otherwise only the listed
/// origins, with credentials so the session cookie travels.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Start the API server on `state.config.api`
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.api.addr();
    let hub = Arc::clone(&state.hub);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Pollify API listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(hub))
    .await
    .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Pollify API shut down gracefully");
    Ok(())
}

/// Periodically drop expired sessions
pub fn spawn_session_purge(store: Arc<Store>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let store = Arc::clone(&store);
            match tokio::task::spawn_blocking(move || store.purge_expired_sessions()).await {
                Ok(Ok(removed)) if removed > 0 => {
                    tracing::info!(removed, "Purged expired sessions");
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "Session purge failed"),
                Err(e) => tracing::warn!(error = %e, "Session purge task failed"),
            }
        }
    })
}

/// Wait for Ctrl+C or SIGTERM, then tell live clients we're going away
async fn shutdown_signal(hub: Arc<ConnectionHub>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
    hub.broadcast(&WsEvent::system("Server is shutting down")).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::PollId;
    use crate::voter::lookup::FixedLookup;
    use crate::voter::VoterIpSource;
    use crate::websocket::{poll_topic, ServerMessage};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn test_state(ip_source: VoterIpSource) -> AppState {
        let mut config = Config::default();
        config.voter.ip_source = ip_source;
        config.api.cors_origins.clear();

        let store = Arc::new(Store::in_memory().unwrap());
        AppState::with_lookup(store, config, Arc::new(FixedLookup(None)))
    }

    fn create_test_app() -> Router {
        build_router(test_state(VoterIpSource::Forwarded))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        }
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        ip: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(ip) = ip {
            builder = builder.header("X-Forwarded-For", ip);
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn signup(app: &Router, email: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/v1/auth/signup",
            None,
            None,
            Some(json!({"email": email, "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_poll(app: &Router, token: &str, question: &str, visibility: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/v1/polls",
            Some(token),
            None,
            Some(json!({
                "question": question,
                "options": ["Yes", "No"],
                "visibility": visibility
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = create_test_app();

        for uri in ["/health/live", "/health/ready"] {
            let (status, _) = call(&app, "GET", uri, None, None, None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = call(&app, "GET", "/health", None, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn test_signup_sets_cookie_and_rejects_duplicates() {
        let app = create_test_app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/signup")
            .header("Content-Type", "application/json")
            .body(Body::from(
                r#"{"email": "olivia@example.com", "password": "secret1"}"#,
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let cookie = response.headers()["set-cookie"].to_str().unwrap().to_string();
        assert!(cookie.starts_with("pollify_session="));

        let body = body_json(response).await;
        assert_eq!(body["user"]["display_name"], "olivia");

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/auth/signup",
            None,
            None,
            Some(json!({"email": "olivia@example.com", "password": "other12"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn test_login_session_and_logout() {
        let app = create_test_app();
        signup(&app, "pat@example.com").await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/auth/login",
            None,
            None,
            Some(json!({"email": "pat@example.com", "password": "wrong-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Invalid email or password");

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/auth/login",
            None,
            None,
            Some(json!({"email": "pat@example.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();

        let (status, body) = call(&app, "GET", "/api/v1/auth/session", Some(&token), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "pat@example.com");

        let (status, _) = call(&app, "POST", "/api/v1/auth/logout", Some(&token), None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, "GET", "/api/v1/auth/session", Some(&token), None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_cookie_authenticates() {
        let app = create_test_app();
        let token = signup(&app, "quinn@example.com").await;

        let request = Request::builder()
            .uri("/api/v1/auth/session")
            .header("Cookie", format!("pollify_session={}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_poll_requires_auth_and_valid_draft() {
        let app = create_test_app();
        let draft = json!({"question": "Lunch?", "options": ["Pizza", "Sushi"]});

        let (status, _) = call(&app, "POST", "/api/v1/polls", None, None, Some(draft.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = signup(&app, "rosa@example.com").await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/polls",
            Some(&token),
            None,
            Some(json!({"question": "Lunch?", "options": ["Pizza", "  "]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Poll must have a question and at least two options."
        );

        let (status, body) = call(&app, "POST", "/api/v1/polls", Some(&token), None, Some(draft)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["visibility"], "private");
        assert_eq!(body["votes"], json!([0, 0]));
        assert_eq!(body["creator_name"], "rosa");
        assert_eq!(body["is_owner"], true);
    }

    #[tokio::test]
    async fn test_vote_flow_and_duplicate_rejection() {
        let app = create_test_app();
        let token = signup(&app, "sam@example.com").await;
        let id = create_poll(&app, &token, "Tabs?", "public").await;
        let vote_uri = format!("/api/v1/polls/{}/votes", id);
        let poll_uri = format!("/api/v1/polls/{}", id);

        let (status, body) = call(
            &app,
            "POST",
            &vote_uri,
            None,
            Some("203.0.113.10"),
            Some(json!({"option": 1})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["votes"], json!([0, 1]));
        assert_eq!(body["voted_option"], 1);

        let (status, body) = call(
            &app,
            "POST",
            &vote_uri,
            None,
            Some("203.0.113.10"),
            Some(json!({"option": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "ALREADY_VOTED");
        assert_eq!(body["error"]["message"], "You've already voted!");

        let (status, _) = call(
            &app,
            "POST",
            &vote_uri,
            None,
            Some("203.0.113.11"),
            Some(json!({"option": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "GET", &poll_uri, None, Some("203.0.113.10"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["votes"], json!([1, 1]));
        assert_eq!(body["total_votes"], 2);
        assert_eq!(body["voter_count"], 2);
        assert_eq!(body["has_voted"], true);
        assert_eq!(body["voted_option"], 1);
        assert!(body.get("voters").is_none());

        let (_, body) = call(&app, "GET", &poll_uri, None, Some("198.51.100.1"), None).await;
        assert_eq!(body["has_voted"], false);
        assert_eq!(body["voted_option"], Value::Null);
    }

    #[tokio::test]
    async fn test_vote_errors() {
        let app = create_test_app();
        let token = signup(&app, "tess@example.com").await;
        let id = create_poll(&app, &token, "Q", "private").await;

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/polls/{}/votes", id),
            None,
            Some("203.0.113.20"),
            Some(json!({"option": 7})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/polls/missing/votes",
            None,
            Some("203.0.113.20"),
            Some(json!({"option": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, "GET", "/api/v1/polls/missing", None, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_vote_without_resolvable_address_is_refused() {
        let app = build_router(test_state(VoterIpSource::Peer));
        let token = signup(&app, "uma@example.com").await;
        let id = create_poll(&app, &token, "Q", "public").await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/polls/{}/votes", id),
            None,
            None,
            Some(json!({"option": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");

        // Viewing still works without an address
        let (status, body) =
            call(&app, "GET", &format!("/api/v1/polls/{}", id), None, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_voted"], false);
    }

    #[tokio::test]
    async fn test_delete_is_owner_only() {
        let app = create_test_app();
        let owner = signup(&app, "vera@example.com").await;
        let other = signup(&app, "walt@example.com").await;
        let id = create_poll(&app, &owner, "Q", "public").await;
        let uri = format!("/api/v1/polls/{}", id);

        let (status, _) = call(&app, "DELETE", &uri, None, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, "DELETE", &uri, Some(&other), None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&app, "DELETE", &uri, Some(&owner), None, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = call(&app, "GET", &uri, None, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_mine_feed_and_stats() {
        let app = create_test_app();
        let xena = signup(&app, "xena@example.com").await;
        let yuri = signup(&app, "yuri@example.com").await;

        create_poll(&app, &xena, "x-private", "private").await;
        create_poll(&app, &xena, "x-public", "public").await;
        create_poll(&app, &yuri, "y-public", "public").await;

        let (status, body) = call(&app, "GET", "/api/v1/polls/mine", Some(&xena), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["polls"][0]["question"], "x-public");
        assert_eq!(body["polls"][1]["question"], "x-private");

        let (status, body) = call(&app, "GET", "/api/v1/feed", None, None, None).await;
        assert_eq!(status, StatusCode::OK);
        let questions: Vec<&str> = body["polls"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["question"].as_str().unwrap())
            .collect();
        assert_eq!(questions, vec!["y-public", "x-public"]);

        let (_, body) = call(&app, "GET", "/api/v1/feed?limit=1", None, None, None).await;
        assert_eq!(body["total"], 1);

        let (status, body) = call(&app, "GET", "/api/v1/stats", Some(&xena), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["all"]["total"], 3);
        assert_eq!(body["all"]["public"], 2);
        assert_eq!(body["mine"]["total"], 2);
        assert_eq!(body["mine"]["private"], 1);

        let (_, body) = call(&app, "GET", "/api/v1/stats", None, None, None).await;
        assert!(body.get("mine").is_none());
    }

    #[tokio::test]
    async fn test_whoami_reports_forwarded_address() {
        let app = create_test_app();
        let (status, body) = call(
            &app,
            "GET",
            "/api/v1/whoami",
            None,
            Some("203.0.113.77, 10.0.0.1"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ip"], "203.0.113.77");
        assert_eq!(body["source"], "forwarded");
    }

    async fn send_raw(
        app: &Router,
        uri: &str,
        token: Option<&str>,
        body: impl Into<Body>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .header("X-Forwarded-For", "203.0.113.30");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let response = app
            .clone()
            .oneshot(builder.body(body.into()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        (status, body_json(response).await)
    }

    fn assert_error_body(body: &Value, code: &str) {
        assert_eq!(body["error"]["code"], code, "body: {body}");
        assert!(body["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
        assert!(body["request_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_malformed_bodies_use_the_error_envelope() {
        let app = create_test_app();
        let token = signup(&app, "zoe@example.com").await;
        let id = create_poll(&app, &token, "Q", "public").await;
        let votes = format!("/api/v1/polls/{}/votes", id);

        let (status, body) = send_raw(&app, "/api/v1/polls", Some(&token), "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body, "VALIDATION_ERROR");

        // Missing field
        let (status, body) =
            send_raw(&app, "/api/v1/auth/signup", None, r#"{"email":"a@b.co"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body, "VALIDATION_ERROR");

        // Wrong type
        let (status, body) = send_raw(&app, &votes, None, r#"{"option":-1}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body, "VALIDATION_ERROR");

        let (status, body) = send_raw(&app, &votes, None, r#"{"option":"first"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body, "VALIDATION_ERROR");

        // Nothing was counted
        let (_, poll) = call(&app, "GET", &format!("/api/v1/polls/{}", id), None, None, None).await;
        assert_eq!(poll["total_votes"], 0);
    }

    #[tokio::test]
    async fn test_missing_content_type_and_oversized_body() {
        let app = create_test_app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/auth/login")
            .body(Body::from(r#"{"email":"a@b.co","password":"secret1"}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_error_body(&body_json(response).await, "VALIDATION_ERROR");

        let huge = format!(r#"{{"email":"{}@b.co","password":"secret1"}}"#, "a".repeat(128 * 1024));
        let (status, body) = send_raw(&app, "/api/v1/auth/signup", None, huge).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_error_body(&body, "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_bad_feed_query_uses_the_error_envelope() {
        let app = create_test_app();
        let (status, body) = call(&app, "GET", "/api/v1/feed?limit=many", None, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_error_body(&body, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_vote_is_pushed_to_poll_subscribers() {
        let state = test_state(VoterIpSource::Forwarded);
        let hub = Arc::clone(&state.hub);
        let app = build_router(state);

        let token = signup(&app, "abe@example.com").await;
        let id = create_poll(&app, &token, "Live?", "private").await;

        let (conn, mut rx) = hub.register().await.unwrap();
        hub.subscribe(&conn, vec![poll_topic(&PollId::from(id.as_str()))])
            .await
            .unwrap();

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/polls/{}/votes", id),
            None,
            Some("203.0.113.5"),
            Some(json!({"option": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            msg,
            ServerMessage::VoteRecorded {
                poll_id: id,
                votes: vec![1, 0],
                total_votes: 1,
            }
        );
    }
}
