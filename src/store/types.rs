//! Core data types for the Pollify store
//!
//! - `Poll`: the poll document (question, options, index-aligned vote counts, voters)
//! - `PollDraft`: user input for a new poll, validated before insert
//! - `Visibility`: public polls appear in the feed, private ones only by link
//! - `User` / `Session`: accounts and bearer sessions

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::error::{StoreError, StoreResult};

/// Maximum question length in characters
pub const MAX_QUESTION_LEN: usize = 300;
/// Maximum description length in characters
pub const MAX_DESCRIPTION_LEN: usize = 2000;
/// Maximum option label length in characters
pub const MAX_OPTION_LEN: usize = 200;
/// Maximum number of options per poll
pub const MAX_OPTIONS: usize = 20;
/// Minimum number of non-empty options per poll
pub const MIN_OPTIONS: usize = 2;

/// Opaque poll identifier (UUIDv4, simple form)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollId(String);

impl PollId {
    /// Generate a fresh id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PollId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PollId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who can discover a poll
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Listed in the public feed
    Public,
    /// Reachable only through its share link
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Visibility {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(StoreError::Validation(format!(
                "Invalid visibility: {}. Use public or private",
                other
            ))),
        }
    }
}

/// User input for a new poll
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollDraft {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

/// A draft that passed validation: trimmed, empty options dropped
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPoll {
    pub question: String,
    pub description: Option<String>,
    pub options: Vec<String>,
    pub visibility: Visibility,
}

impl PollDraft {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    /// Builder method: add an option
    pub fn option(mut self, label: impl Into<String>) -> Self {
        self.options.push(label.into());
        self
    }

    /// Builder method: set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method: set visibility
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Trim every field, drop blank options, and enforce the poll rules.
    pub fn validate(&self) -> StoreResult<ValidPoll> {
        let question = self.question.trim().to_string();
        let options: Vec<String> = self
            .options
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if question.is_empty() || options.len() < MIN_OPTIONS {
            return Err(StoreError::Validation(
                "Poll must have a question and at least two options.".to_string(),
            ));
        }

        if question.chars().count() > MAX_QUESTION_LEN {
            return Err(StoreError::Validation(format!(
                "Question exceeds maximum length of {} characters",
                MAX_QUESTION_LEN
            )));
        }

        if options.len() > MAX_OPTIONS {
            return Err(StoreError::Validation(format!(
                "A poll can have at most {} options",
                MAX_OPTIONS
            )));
        }

        if let Some(long) = options.iter().find(|o| o.chars().count() > MAX_OPTION_LEN) {
            return Err(StoreError::Validation(format!(
                "Option '{}...' exceeds maximum length of {} characters",
                long.chars().take(20).collect::<String>(),
                MAX_OPTION_LEN
            )));
        }

        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        if let Some(d) = &description {
            if d.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(StoreError::Validation(format!(
                    "Description exceeds maximum length of {} characters",
                    MAX_DESCRIPTION_LEN
                )));
            }
        }

        Ok(ValidPoll {
            question,
            description,
            options,
            visibility: self.visibility,
        })
    }
}

/// A stored poll document
///
/// `votes` is index-aligned with `options`; `voters` holds each voter IP once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Poll {
    pub id: PollId,
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    pub options: Vec<String>,
    pub votes: Vec<u64>,
    pub voters: Vec<String>,
    pub created_by: String,
    pub creator_name: String,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Sum of all option counts
    pub fn total_votes(&self) -> u64 {
        self.votes.iter().sum()
    }

    pub fn has_voted(&self, voter: &str) -> bool {
        self.voters.iter().any(|v| v == voter)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Index of the option with the most votes; ties resolve to the first
    pub fn leading_option(&self) -> Option<usize> {
        if self.total_votes() == 0 {
            return None;
        }
        self.votes
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
            .map(|(i, _)| i)
    }
}

/// Aggregate poll counts computed by the database
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollCounts {
    pub total: u64,
    pub public: u64,
    pub private: u64,
    pub votes: u64,
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// A bearer session issued at sign-in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Convert stored milliseconds back to a UTC timestamp
pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}
