//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{Poll, PollCounts, Session, User, Visibility};

/// Browser path of a poll's voting page
pub fn share_path(poll_id: &str) -> String {
    format!("/poll/{}", poll_id)
}

// ============================================
// AUTH DTOs
// ============================================

/// Sign-up and login body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Sign-up / login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthResponse {
    pub fn new(user: &User, session: &Session) -> Self {
        Self {
            user: user.into(),
            token: session.token.clone(),
            expires_at: session.expires_at,
        }
    }
}

// ============================================
// POLL DTOs
// ============================================

/// Full poll as seen by one caller. Voter addresses are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollView {
    pub id: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Vec<String>,
    pub votes: Vec<u64>,
    pub total_votes: u64,
    pub voter_count: usize,
    pub creator_name: String,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    /// Whether the caller's address already voted
    pub has_voted: bool,
    /// Option the caller voted for
    #[serde(default)]
    pub voted_option: Option<usize>,
    /// Whether the caller created the poll
    pub is_owner: bool,
    pub share_path: String,
}

impl PollView {
    pub fn new(poll: &Poll, voted_option: Option<usize>, viewer_id: Option<&str>) -> Self {
        Self {
            id: poll.id.to_string(),
            question: poll.question.clone(),
            description: poll.description.clone(),
            options: poll.options.clone(),
            votes: poll.votes.clone(),
            total_votes: poll.total_votes(),
            voter_count: poll.voters.len(),
            creator_name: poll.creator_name.clone(),
            visibility: poll.visibility,
            created_at: poll.created_at,
            has_voted: voted_option.is_some(),
            voted_option,
            is_owner: viewer_id.is_some_and(|id| poll.is_owned_by(id)),
            share_path: share_path(poll.id.as_str()),
        }
    }
}

/// One row in "my polls" and the public feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSummary {
    pub id: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub option_count: usize,
    pub total_votes: u64,
    pub creator_name: String,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub share_path: String,
}

impl From<&Poll> for PollSummary {
    fn from(poll: &Poll) -> Self {
        Self {
            id: poll.id.to_string(),
            question: poll.question.clone(),
            description: poll.description.clone(),
            option_count: poll.options.len(),
            total_votes: poll.total_votes(),
            creator_name: poll.creator_name.clone(),
            visibility: poll.visibility,
            created_at: poll.created_at,
            share_path: share_path(poll.id.as_str()),
        }
    }
}

/// List of polls with count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollListResponse {
    pub polls: Vec<PollSummary>,
    pub total: usize,
}

impl PollListResponse {
    pub fn new(polls: &[Poll]) -> Self {
        Self {
            polls: polls.iter().map(PollSummary::from).collect(),
            total: polls.len(),
        }
    }
}

/// Vote body: zero-based option index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub option: usize,
}

/// Query parameters for the public feed
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

// ============================================
// STATS / WHOAMI / HEALTH DTOs
// ============================================

/// Aggregate counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Every poll on this server
    pub all: PollCounts,
    /// The caller's own polls, when signed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mine: Option<PollCounts>,
    pub live_connections: usize,
}

/// The voter address the server resolves for the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    pub ip: String,
    pub source: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "unhealthy"
    pub status: String,
    /// Database status: "ok" or "error"
    pub database: String,
    pub uptime_seconds: u64,
    pub live_connections: usize,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PollId;

    fn poll() -> Poll {
        Poll {
            id: PollId::from("p9"),
            question: "Pick one".to_string(),
            description: None,
            options: vec!["A".to_string(), "B".to_string()],
            votes: vec![1, 2],
            voters: vec!["203.0.113.1".into(), "203.0.113.2".into(), "203.0.113.3".into()],
            created_by: "owner".to_string(),
            creator_name: "olga".to_string(),
            visibility: Visibility::Public,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_poll_view_hides_voters() {
        let view = PollView::new(&poll(), Some(1), Some("owner"));
        let json = serde_json::to_value(&view).unwrap();

        assert!(json.get("voters").is_none());
        assert_eq!(json["voter_count"], 3);
        assert_eq!(json["total_votes"], 3);
        assert_eq!(json["has_voted"], true);
        assert_eq!(json["voted_option"], 1);
        assert_eq!(json["is_owner"], true);
        assert_eq!(json["share_path"], "/poll/p9");
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_poll_view_for_stranger() {
        let view = PollView::new(&poll(), None, None);
        assert!(!view.has_voted);
        assert!(!view.is_owner);
    }

    #[test]
    fn test_list_response() {
        let list = PollListResponse::new(&[poll(), poll()]);
        assert_eq!(list.total, 2);
        assert_eq!(list.polls[0].option_count, 2);
    }
}
