//! Vote Routes
//!
//! - POST /api/v1/polls/:id/votes - Cast one vote per voter address

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{PollView, VoteRequest};
use crate::api::error::ApiResult;
use crate::api::extract::ApiJson;
use crate::api::state::AppState;
use crate::auth::MaybeUser;
use crate::store::PollId;
use crate::voter::VoterIp;
use crate::websocket::WsEvent;

/// POST /api/v1/polls/:id/votes
///
/// Anyone with the link may vote, signed in or not. A second vote from the
/// same address is rejected with 409.
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    MaybeUser(viewer): MaybeUser,
    VoterIp(ip): VoterIp,
    ApiJson(req): ApiJson<VoteRequest>,
) -> ApiResult<Json<PollView>> {
    let id = PollId::from(id);
    let option = req.option;

    let voter = ip.to_string();
    let target = id.clone();
    let poll = state
        .with_store(move |store| store.record_vote(&target, option, &voter))
        .await?;

    state.hub.broadcast(&WsEvent::vote_recorded(&poll)).await;
    tracing::info!(poll_id = %id, option, total_votes = poll.total_votes(), "Vote recorded");

    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    Ok(Json(PollView::new(&poll, Some(option), viewer_id)))
}
