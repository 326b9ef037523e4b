//! Poll Routes
//!
//! - POST /api/v1/polls - Create a poll (signed in)
//! - GET /api/v1/polls/mine - The caller's polls, newest first
//! - GET /api/v1/polls/:id - One poll as seen by the caller
//! - DELETE /api/v1/polls/:id - Delete a poll (creator only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{PollListResponse, PollView};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::auth::{AuthUser, MaybeUser};
use crate::store::{PollDraft, PollId};
use crate::voter::VoterIp;
use crate::websocket::{WsEvent, FEED_TOPIC};

/// POST /api/v1/polls
///
/// Validates the draft (question plus at least two non-empty options) and
/// stores it with zeroed counts.
pub async fn create_poll(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    ApiJson(draft): ApiJson<PollDraft>,
) -> ApiResult<(StatusCode, Json<PollView>)> {
    let creator = user.clone();
    let poll = state
        .with_store(move |store| store.create_poll(&creator, &draft))
        .await?;

    if poll.is_public() {
        state.hub.broadcast(&WsEvent::poll_created(&poll)).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(PollView::new(&poll, None, Some(&user.id))),
    ))
}

/// GET /api/v1/polls/mine
pub async fn my_polls(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<PollListResponse>> {
    let polls = state
        .with_store(move |store| store.list_polls_by_creator(&user.id))
        .await?;

    Ok(Json(PollListResponse::new(&polls)))
}

/// GET /api/v1/polls/:id
///
/// Reachable by anyone holding the link, private polls included. When the
/// caller's address can be resolved the view says whether and how they voted.
pub async fn get_poll(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    MaybeUser(viewer): MaybeUser,
    voter: Option<VoterIp>,
) -> ApiResult<Json<PollView>> {
    let id = PollId::from(id);
    let voter = voter.map(|VoterIp(ip)| ip.to_string());

    let lookup_id = id.clone();
    let (poll, voted_option) = state
        .with_store(move |store| {
            let Some(poll) = store.get_poll(&lookup_id)? else {
                return Ok((None, None));
            };
            let voted = match &voter {
                Some(ip) => store.voted_option(&lookup_id, ip)?,
                None => None,
            };
            Ok((Some(poll), voted))
        })
        .await?;

    let poll = poll.ok_or_else(|| ApiError::NotFound(format!("Poll not found: {}", id)))?;
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());

    Ok(Json(PollView::new(&poll, voted_option, viewer_id)))
}

/// DELETE /api/v1/polls/:id
pub async fn delete_poll(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = PollId::from(id);

    let target = id.clone();
    let poll = state
        .with_store(move |store| store.delete_poll(&target, &user.id))
        .await?;

    state.hub.broadcast(&WsEvent::poll_deleted(&id)).await;
    if poll.is_public() {
        state
            .hub
            .broadcast(&WsEvent::poll_deleted(&id).on_topic(FEED_TOPIC))
            .await;
    }

    Ok(StatusCode::NO_CONTENT)
}
