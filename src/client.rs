//! Pollify REST API Client
//!
//! Typed HTTP client for a running Pollify server. Used by `pollify-cli`.

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::api::dto::{
    AuthResponse, CredentialsRequest, HealthResponse, PollListResponse, PollView, StatsResponse,
    UserView, VoteRequest, WhoAmIResponse,
};
use crate::api::error::ErrorResponse;
use crate::store::PollDraft;

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server (e.g., "http://localhost:8090")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }
}

/// Pollify REST API client
pub struct PollifyClient {
    client: Client,
    config: ClientConfig,
    token: Option<String>,
}

impl PollifyClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            token: None,
        })
    }

    /// Attach a session token sent as a bearer credential
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ---- auth ----

    pub async fn signup(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "/api/v1/auth/signup", Some(&body))
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = CredentialsRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "/api/v1/auth/login", Some(&body))
            .await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        self.send_empty(Method::POST, "/api/v1/auth/logout").await
    }

    pub async fn session(&self) -> Result<UserView, ClientError> {
        self.get("/api/v1/auth/session").await
    }

    // ---- polls ----

    pub async fn create_poll(&self, draft: &PollDraft) -> Result<PollView, ClientError> {
        self.send_json(Method::POST, "/api/v1/polls", Some(draft))
            .await
    }

    pub async fn my_polls(&self) -> Result<PollListResponse, ClientError> {
        self.get("/api/v1/polls/mine").await
    }

    pub async fn get_poll(&self, id: &str) -> Result<PollView, ClientError> {
        self.get(&format!("/api/v1/polls/{}", id)).await
    }

    /// Vote for the zero-based `option`
    pub async fn vote(&self, id: &str, option: usize) -> Result<PollView, ClientError> {
        self.send_json(
            Method::POST,
            &format!("/api/v1/polls/{}/votes", id),
            Some(&VoteRequest { option }),
        )
        .await
    }

    pub async fn delete_poll(&self, id: &str) -> Result<(), ClientError> {
        self.send_empty(Method::DELETE, &format!("/api/v1/polls/{}", id))
            .await
    }

    pub async fn feed(&self, limit: Option<usize>) -> Result<PollListResponse, ClientError> {
        match limit {
            Some(limit) => self.get(&format!("/api/v1/feed?limit={}", limit)).await,
            None => self.get("/api/v1/feed").await,
        }
    }

    pub async fn stats(&self) -> Result<StatsResponse, ClientError> {
        self.get("/api/v1/stats").await
    }

    pub async fn whoami(&self) -> Result<WhoAmIResponse, ClientError> {
        self.get("/api/v1/whoami").await
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get("/health").await
    }

    // ---- plumbing ----

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Single attempt; failures surface to the caller as-is
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|e| {
                let error = transport_error(e);
                tracing::debug!(error = %error, path, "GET failed");
                error
            })?;
        decode(response).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError> {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(transport_error)?;
        decode(response).await
    }

    async fn send_empty(&self, method: Method, path: &str) -> Result<(), ClientError> {
        let response = self
            .request(method, path)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    response
        .json()
        .await
        .map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) => ClientError::Api {
            status,
            code: body.error.code,
            message: body.error.message,
        },
        Err(_) => ClientError::Api {
            status,
            code: "UNKNOWN".to_string(),
            message: text,
        },
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else if e.is_connect() {
        ClientError::Unavailable
    } else {
        ClientError::Request(e)
    }
}

/// Errors returned by [`PollifyClient`]
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Pollify server unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with an error body
    #[error("{message} ({status} {code})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// HTTP status when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{build_router, AppState};
    use crate::config::Config;
    use crate::store::{Store, Visibility};
    use crate::voter::lookup::FixedLookup;
    use std::net::SocketAddr;
    use std::sync::Arc;

    async fn spawn_server() -> String {
        let store = Arc::new(Store::in_memory().unwrap());
        let lookup = Arc::new(FixedLookup(Some("198.51.100.9".parse().unwrap())));
        let state = AppState::with_lookup(store, Config::default(), lookup);
        let router = build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        format!("http://{}", addr)
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = ClientConfig::new("http://localhost:8090/");
        assert_eq!(config.base_url, "http://localhost:8090");
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout_ms: 1000,
        };
        let client = PollifyClient::new(config).unwrap();

        // One attempt, no backoff: the refusal comes back immediately
        let started = std::time::Instant::now();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, ClientError::Unavailable | ClientError::Timeout));
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_full_round_trip_against_live_server() {
        let base_url = spawn_server().await;
        let anon = PollifyClient::new(ClientConfig::new(&base_url)).unwrap();

        let health = anon.health().await.unwrap();
        assert_eq!(health.status, "healthy");

        let auth = anon.signup("cleo@example.com", "secret1").await.unwrap();
        let client = PollifyClient::new(ClientConfig::new(&base_url))
            .unwrap()
            .with_token(auth.token);

        assert_eq!(client.session().await.unwrap().email, "cleo@example.com");

        let draft = PollDraft {
            question: "Coffee or tea?".to_string(),
            description: None,
            options: vec!["Coffee".to_string(), "Tea".to_string()],
            visibility: Visibility::Public,
        };
        let poll = client.create_poll(&draft).await.unwrap();
        assert!(poll.is_owner);

        // Loopback peer falls back to the looked-up public address
        assert_eq!(anon.whoami().await.unwrap().ip, "198.51.100.9");

        let voted = anon.vote(&poll.id, 1).await.unwrap();
        assert_eq!(voted.votes, vec![0, 1]);

        let err = anon.vote(&poll.id, 0).await.unwrap_err();
        match err {
            ClientError::Api { status, code, .. } => {
                assert_eq!(status, 409);
                assert_eq!(code, "ALREADY_VOTED");
            }
            other => panic!("unexpected error: {other}"),
        }

        let feed = anon.feed(Some(10)).await.unwrap();
        assert_eq!(feed.total, 1);

        let err = anon.delete_poll(&poll.id).await.unwrap_err();
        assert_eq!(err.status(), Some(401));

        client.delete_poll(&poll.id).await.unwrap();
        assert_eq!(client.my_polls().await.unwrap().total, 0);

        client.logout().await.unwrap();
        assert_eq!(client.session().await.unwrap_err().status(), Some(401));
    }
}
