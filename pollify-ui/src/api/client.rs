//! HTTP API Client
//!
//! Functions for communicating with the Pollify REST API.

use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8090/api/v1";

const API_URL_KEY: &str = "pollify_api_url";
const TOKEN_KEY: &str = "pollify_token";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Get the API base URL from local storage or use default
pub fn get_api_base() -> String {
    let url = local_storage()
        .and_then(|storage| storage.get_item(API_URL_KEY).ok().flatten())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    url.trim_end_matches('/').to_string()
}

/// Session token saved at login
pub fn stored_token() -> Option<String> {
    local_storage().and_then(|storage| storage.get_item(TOKEN_KEY).ok().flatten())
}

pub fn store_token(token: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(TOKEN_KEY, token);
    }
}

pub fn clear_token() {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(TOKEN_KEY);
    }
}

/// Absolute link a poll can be shared with
pub fn share_url(share_path: &str) -> String {
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();
    format!("{}{}", origin, share_path)
}

// ============ Response Types ============

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct PollView {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    pub options: Vec<String>,
    pub votes: Vec<u64>,
    pub total_votes: u64,
    pub creator_name: String,
    pub visibility: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub has_voted: bool,
    #[serde(default)]
    pub voted_option: Option<usize>,
    pub is_owner: bool,
    pub share_path: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct PollSummary {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    pub option_count: usize,
    pub total_votes: u64,
    pub creator_name: String,
    pub visibility: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub share_path: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PollListResponse {
    pub polls: Vec<PollSummary>,
    pub total: usize,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, serde::Serialize)]
pub struct NewPoll {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Vec<String>,
    pub visibility: String,
}

// ============ Plumbing ============

fn with_auth(builder: RequestBuilder) -> RequestBuilder {
    match stored_token() {
        Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
        None => builder,
    }
}

async fn error_message(response: Response, fallback: &str) -> String {
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.error.message,
        Err(_) => fallback.to_string(),
    }
}

async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, String> {
    if !response.ok() {
        return Err(error_message(response, fallback).await);
    }
    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

async fn get_json<T: DeserializeOwned>(path: &str, fallback: &str) -> Result<T, String> {
    let response = with_auth(Request::get(&format!("{}{}", get_api_base(), path)))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    decode(response, fallback).await
}

async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
    path: &str,
    body: &B,
    fallback: &str,
) -> Result<T, String> {
    let response = with_auth(Request::post(&format!("{}{}", get_api_base(), path)))
        .json(body)
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;
    decode(response, fallback).await
}

// ============ API Functions ============

/// Create an account; stores the returned token
pub async fn signup(email: &str, password: &str) -> Result<UserView, String> {
    let auth: AuthResponse = post_json(
        "/auth/signup",
        &serde_json::json!({ "email": email, "password": password }),
        "Sign up failed",
    )
    .await?;
    store_token(&auth.token);
    Ok(auth.user)
}

/// Sign in; stores the returned token
pub async fn login(email: &str, password: &str) -> Result<UserView, String> {
    let auth: AuthResponse = post_json(
        "/auth/login",
        &serde_json::json!({ "email": email, "password": password }),
        "Login failed",
    )
    .await?;
    store_token(&auth.token);
    Ok(auth.user)
}

/// Revoke the session server-side and forget the token
pub async fn logout() -> Result<(), String> {
    let result = with_auth(Request::post(&format!("{}/auth/logout", get_api_base())))
        .send()
        .await;
    clear_token();

    match result {
        Ok(response) if response.ok() => Ok(()),
        Ok(response) => Err(error_message(response, "Logout failed").await),
        Err(e) => Err(format!("Network error: {}", e)),
    }
}

/// Current user for the stored token, if any
pub async fn current_user() -> Option<UserView> {
    stored_token()?;
    match get_json::<UserView>("/auth/session", "Session expired").await {
        Ok(user) => Some(user),
        Err(_) => {
            clear_token();
            None
        }
    }
}

pub async fn create_poll(poll: &NewPoll) -> Result<PollView, String> {
    post_json("/polls", poll, "Failed to create poll").await
}

pub async fn my_polls() -> Result<Vec<PollSummary>, String> {
    let list: PollListResponse = get_json("/polls/mine", "Failed to load your polls").await?;
    Ok(list.polls)
}

pub async fn fetch_poll(id: &str) -> Result<PollView, String> {
    get_json(&format!("/polls/{}", id), "Poll not found").await
}

pub async fn vote(id: &str, option: usize) -> Result<PollView, String> {
    post_json(
        &format!("/polls/{}/votes", id),
        &serde_json::json!({ "option": option }),
        "Failed to record vote",
    )
    .await
}

pub async fn delete_poll(id: &str) -> Result<(), String> {
    let response = with_auth(Request::delete(&format!("{}/polls/{}", get_api_base(), id)))
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if response.ok() {
        Ok(())
    } else {
        Err(error_message(response, "Failed to delete poll").await)
    }
}

pub async fn public_feed() -> Result<Vec<PollSummary>, String> {
    let list: PollListResponse = get_json("/feed", "Failed to load public polls").await?;
    Ok(list.polls)
}
