//! Stats and identity routes
//!
//! - GET /api/v1/stats - Aggregate poll counts, plus the caller's own
//! - GET /api/v1/whoami - The voter address the server sees for the caller

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{StatsResponse, WhoAmIResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::auth::MaybeUser;
use crate::voter::VoterIp;

/// GET /api/v1/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    MaybeUser(user): MaybeUser,
) -> ApiResult<Json<StatsResponse>> {
    let (all, mine) = state
        .with_store(move |store| {
            let all = store.count_polls(None)?;
            let mine = match &user {
                Some(u) => Some(store.count_polls(Some(&u.id))?),
                None => None,
            };
            Ok((all, mine))
        })
        .await?;

    Ok(Json(StatsResponse {
        all,
        mine,
        live_connections: state.ws_connection_count().await,
    }))
}

/// GET /api/v1/whoami
pub async fn whoami(
    State(state): State<Arc<AppState>>,
    VoterIp(ip): VoterIp,
) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        ip: ip.to_string(),
        source: state.voter.source().to_string(),
    })
}
