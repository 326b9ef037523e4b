//! Public Feed Route
//!
//! - GET /api/v1/feed?limit=N - Public polls, newest first

use axum::{
    extract::State,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{FeedQuery, PollListResponse};
use crate::api::error::ApiResult;
use crate::api::extract::ApiQuery;
use crate::api::state::AppState;

pub const DEFAULT_FEED_LIMIT: usize = 50;
pub const MAX_FEED_LIMIT: usize = 200;

/// GET /api/v1/feed
pub async fn public_feed(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> ApiResult<Json<PollListResponse>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_FEED_LIMIT)
        .clamp(1, MAX_FEED_LIMIT);

    let polls = state
        .with_store(move |store| store.list_public_polls(limit))
        .await?;

    Ok(Json(PollListResponse::new(&polls)))
}
