//! Auth Routes
//!
//! - POST /api/v1/auth/signup - Create an account and sign in
//! - POST /api/v1/auth/login - Sign in
//! - POST /api/v1/auth/logout - Revoke the current session
//! - GET /api/v1/auth/session - The signed-in user

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AuthResponse, CredentialsRequest, UserView};
use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::auth::{clear_session_cookie, session_cookie, session_token, AuthUser};
use crate::store::{Session, User};

fn signed_in(state: &AppState, user: &User, session: &Session) -> impl IntoResponse {
    let max_age = (session.expires_at - session.created_at).num_seconds();
    let cookie = session_cookie(&session.token, max_age, state.auth.config().secure_cookie);

    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(AuthResponse::new(user, session)),
    )
}

/// POST /api/v1/auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let (user, session) = state.auth.sign_up(&req.email, &req.password).await?;

    Ok((StatusCode::CREATED, signed_in(&state, &user, &session)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CredentialsRequest>,
) -> ApiResult<impl IntoResponse> {
    let (user, session) = state.auth.sign_in(&req.email, &req.password).await?;

    Ok(signed_in(&state, &user, &session))
}

/// POST /api/v1/auth/logout
///
/// Always succeeds; the cookie is cleared even without a live session.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(token) = session_token(&headers) {
        state.auth.sign_out(&token).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
    ))
}

/// GET /api/v1/auth/session
pub async fn current_session(AuthUser(user): AuthUser) -> Json<UserView> {
    Json(UserView::from(&user))
}
