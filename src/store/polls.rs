//! Poll operations
//!
//! Create, point-read, filtered and ordered queries, vote recording,
//! deletion and aggregate counts over the `polls` / `poll_votes` tables.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{from_millis, Poll, PollCounts, PollDraft, PollId, User, Visibility};
use crate::store::Store;

const POLL_COLUMNS: &str =
    "id, question, description, options, votes, created_by, creator_name, visibility, created_at";

/// A poll row whose JSON columns (options, votes) are still encoded
type RawPoll = (Poll, String, String);

fn read_poll_row(row: &Row<'_>) -> rusqlite::Result<RawPoll> {
    let visibility: String = row.get(7)?;
    let poll = Poll {
        id: PollId::from(row.get::<_, String>(0)?),
        question: row.get(1)?,
        description: row.get(2)?,
        options: Vec::new(),
        votes: Vec::new(),
        voters: Vec::new(),
        created_by: row.get(5)?,
        creator_name: row.get(6)?,
        visibility: if visibility == "public" {
            Visibility::Public
        } else {
            Visibility::Private
        },
        created_at: from_millis(row.get(8)?),
    };
    Ok((poll, row.get(3)?, row.get(4)?))
}

fn decode_poll(conn: &Connection, raw: RawPoll) -> StoreResult<Poll> {
    let (mut poll, options, votes) = raw;
    poll.options = serde_json::from_str(&options)?;
    poll.votes = serde_json::from_str(&votes)?;
    poll.voters = fetch_voters(conn, &poll.id)?;
    Ok(poll)
}

impl Store {
    /// Validate a draft and insert it as a new poll owned by `creator`.
    pub fn create_poll(&self, creator: &User, draft: &PollDraft) -> StoreResult<Poll> {
        let valid = draft.validate()?;
        let poll = Poll {
            id: PollId::generate(),
            question: valid.question,
            description: valid.description,
            votes: vec![0; valid.options.len()],
            options: valid.options,
            voters: Vec::new(),
            created_by: creator.id.clone(),
            creator_name: creator.display_name.clone(),
            visibility: valid.visibility,
            created_at: Utc::now(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO polls (id, question, description, options, votes,
                                created_by, creator_name, visibility, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                poll.id.as_str(),
                poll.question,
                poll.description,
                serde_json::to_string(&poll.options)?,
                serde_json::to_string(&poll.votes)?,
                poll.created_by,
                poll.creator_name,
                poll.visibility.as_str(),
                poll.created_at.timestamp_millis(),
            ],
        )?;

        tracing::info!(
            poll_id = %poll.id,
            user_id = %creator.id,
            options = poll.options.len(),
            visibility = %poll.visibility,
            "Created poll"
        );

        Ok(poll)
    }

    /// Point read, voters included
    pub fn get_poll(&self, id: &PollId) -> StoreResult<Option<Poll>> {
        let conn = self.lock()?;
        fetch_poll(&conn, id)
    }

    /// All polls created by `user_id`, newest first
    pub fn list_polls_by_creator(&self, user_id: &str) -> StoreResult<Vec<Poll>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM polls WHERE created_by = ?1 ORDER BY created_at DESC, rowid DESC",
            POLL_COLUMNS
        );
        query_polls(&conn, &sql, params![user_id])
    }

    /// Public polls, newest first
    pub fn list_public_polls(&self, limit: usize) -> StoreResult<Vec<Poll>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM polls WHERE visibility = 'public'
             ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            POLL_COLUMNS
        );
        query_polls(&conn, &sql, params![limit as i64])
    }

    /// Delete a poll; only its creator may do so. Returns the deleted poll.
    pub fn delete_poll(&self, id: &PollId, requester_id: &str) -> StoreResult<Poll> {
        let conn = self.lock()?;

        let poll = fetch_poll(&conn, id)?
            .ok_or_else(|| StoreError::PollNotFound(id.to_string()))?;
        if !poll.is_owned_by(requester_id) {
            return Err(StoreError::Forbidden);
        }

        conn.execute("DELETE FROM polls WHERE id = ?1", params![id.as_str()])?;
        tracing::info!(poll_id = %id, user_id = %requester_id, "Deleted poll");
        Ok(poll)
    }

    /// Record one vote from `voter` for `option_index`.
    ///
    /// Runs in an IMMEDIATE transaction: the duplicate check, the counter
    /// increment and the voter insert are atomic with respect to other voters.
    pub fn record_vote(
        &self,
        id: &PollId,
        option_index: usize,
        voter: &str,
    ) -> StoreResult<Poll> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let votes_json: Option<String> = tx
            .query_row(
                "SELECT votes FROM polls WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        let votes_json = votes_json.ok_or_else(|| StoreError::PollNotFound(id.to_string()))?;
        let mut votes: Vec<u64> = serde_json::from_str(&votes_json)?;

        if option_index >= votes.len() {
            return Err(StoreError::InvalidOption {
                index: option_index,
                options: votes.len(),
            });
        }

        let already: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM poll_votes WHERE poll_id = ?1 AND voter = ?2)",
            params![id.as_str(), voter],
            |row| row.get(0),
        )?;
        if already {
            return Err(StoreError::AlreadyVoted);
        }

        votes[option_index] += 1;

        tx.execute(
            "UPDATE polls SET votes = ?2 WHERE id = ?1",
            params![id.as_str(), serde_json::to_string(&votes)?],
        )?;
        tx.execute(
            "INSERT INTO poll_votes (poll_id, voter, option_index, voted_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                id.as_str(),
                voter,
                option_index as i64,
                Utc::now().timestamp_millis()
            ],
        )?;
        tx.commit()?;

        tracing::debug!(poll_id = %id, option = option_index, "Recorded vote");

        fetch_poll(&conn, id)?.ok_or_else(|| StoreError::PollNotFound(id.to_string()))
    }

    /// Option this voter chose, if they voted
    pub fn voted_option(&self, id: &PollId, voter: &str) -> StoreResult<Option<usize>> {
        let conn = self.lock()?;
        let index: Option<i64> = conn
            .query_row(
                "SELECT option_index FROM poll_votes WHERE poll_id = ?1 AND voter = ?2",
                params![id.as_str(), voter],
                |row| row.get(0),
            )
            .optional()?;
        Ok(index.map(|i| i as usize))
    }

    /// Aggregate counts, optionally restricted to one creator
    pub fn count_polls(&self, creator: Option<&str>) -> StoreResult<PollCounts> {
        let conn = self.lock()?;

        let (total, public): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(visibility = 'public'), 0) FROM polls
             WHERE ?1 IS NULL OR created_by = ?1",
            params![creator],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let votes: i64 = conn.query_row(
            "SELECT COUNT(*) FROM poll_votes v JOIN polls p ON p.id = v.poll_id
             WHERE ?1 IS NULL OR p.created_by = ?1",
            params![creator],
            |row| row.get(0),
        )?;

        Ok(PollCounts {
            total: total as u64,
            public: public as u64,
            private: (total - public) as u64,
            votes: votes as u64,
        })
    }
}

fn fetch_poll(conn: &Connection, id: &PollId) -> StoreResult<Option<Poll>> {
    let sql = format!("SELECT {} FROM polls WHERE id = ?1", POLL_COLUMNS);
    let raw = conn
        .query_row(&sql, params![id.as_str()], read_poll_row)
        .optional()?;

    raw.map(|raw| decode_poll(conn, raw)).transpose()
}

fn query_polls(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> StoreResult<Vec<Poll>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let raws = stmt
        .query_map(params, read_poll_row)?
        .collect::<Result<Vec<_>, _>>()?;

    raws.into_iter().map(|raw| decode_poll(conn, raw)).collect()
}

fn fetch_voters(conn: &Connection, id: &PollId) -> StoreResult<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT voter FROM poll_votes WHERE poll_id = ?1 ORDER BY voted_at, rowid",
    )?;
    let voters = stmt
        .query_map(params![id.as_str()], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(voters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn setup() -> (Store, User) {
        let store = Store::in_memory().unwrap();
        let user = store
            .create_user("alice@example.com", "hash", "alice")
            .unwrap();
        (store, user)
    }

    fn draft(question: &str, visibility: Visibility) -> PollDraft {
        PollDraft::new(question)
            .option("Yes")
            .option("No")
            .visibility(visibility)
    }

    #[test]
    fn test_create_and_get_poll() {
        let (store, user) = setup();

        let created = store
            .create_poll(&user, &draft("Ship it?", Visibility::Public).description("Friday deploy"))
            .unwrap();
        assert_eq!(created.votes, vec![0, 0]);
        assert!(created.voters.is_empty());
        assert_eq!(created.creator_name, "alice");

        let fetched = store.get_poll(&created.id).unwrap().unwrap();
        assert_eq!(fetched.question, "Ship it?");
        assert_eq!(fetched.description.as_deref(), Some("Friday deploy"));
        assert_eq!(fetched.options, vec!["Yes", "No"]);
        assert_eq!(fetched.visibility, Visibility::Public);
        assert_eq!(fetched.created_by, user.id);
        assert_eq!(
            fetched.created_at.timestamp_millis(),
            created.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_create_rejects_invalid_draft() {
        let (store, user) = setup();
        let bad = PollDraft::new("Q").option("one");
        assert!(matches!(
            store.create_poll(&user, &bad),
            Err(StoreError::Validation(_))
        ));
        assert_eq!(store.count_polls(None).unwrap().total, 0);
    }

    #[test]
    fn test_get_missing_poll() {
        let (store, _) = setup();
        assert!(store.get_poll(&PollId::from("nope")).unwrap().is_none());
    }

    #[test]
    fn test_record_vote() {
        let (store, user) = setup();
        let poll = store.create_poll(&user, &draft("Q", Visibility::Private)).unwrap();

        let updated = store.record_vote(&poll.id, 1, "198.51.100.1").unwrap();
        assert_eq!(updated.votes, vec![0, 1]);
        assert_eq!(updated.voters, vec!["198.51.100.1"]);

        let updated = store.record_vote(&poll.id, 1, "198.51.100.2").unwrap();
        assert_eq!(updated.votes, vec![0, 2]);
        assert_eq!(updated.votes.len(), updated.options.len());
    }

    #[test]
    fn test_duplicate_vote_rejected() {
        let (store, user) = setup();
        let poll = store.create_poll(&user, &draft("Q", Visibility::Private)).unwrap();

        store.record_vote(&poll.id, 0, "198.51.100.1").unwrap();
        let err = store.record_vote(&poll.id, 1, "198.51.100.1").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyVoted));

        let poll = store.get_poll(&poll.id).unwrap().unwrap();
        assert_eq!(poll.votes, vec![1, 0]);
        assert_eq!(poll.voters.len(), 1);
    }

    #[test]
    fn test_vote_invalid_option_and_missing_poll() {
        let (store, user) = setup();
        let poll = store.create_poll(&user, &draft("Q", Visibility::Private)).unwrap();

        assert!(matches!(
            store.record_vote(&poll.id, 2, "1.1.1.1"),
            Err(StoreError::InvalidOption { index: 2, options: 2 })
        ));
        assert!(matches!(
            store.record_vote(&PollId::from("missing"), 0, "1.1.1.1"),
            Err(StoreError::PollNotFound(_))
        ));
    }

    #[test]
    fn test_voted_option_is_exact_even_with_ties() {
        let (store, user) = setup();
        let poll = store.create_poll(&user, &draft("Q", Visibility::Private)).unwrap();

        store.record_vote(&poll.id, 0, "a").unwrap();
        store.record_vote(&poll.id, 1, "b").unwrap();

        assert_eq!(store.voted_option(&poll.id, "a").unwrap(), Some(0));
        assert_eq!(store.voted_option(&poll.id, "b").unwrap(), Some(1));
        assert_eq!(store.voted_option(&poll.id, "c").unwrap(), None);
    }

    #[test]
    fn test_concurrent_votes_do_not_lose_increments() {
        let (store, user) = setup();
        let poll = store.create_poll(&user, &draft("Q", Visibility::Public)).unwrap();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = poll.id.clone();
                std::thread::spawn(move || {
                    store.record_vote(&id, i % 2, &format!("10.0.0.{}", i)).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let poll = store.get_poll(&poll.id).unwrap().unwrap();
        assert_eq!(poll.votes, vec![8, 8]);
        assert_eq!(poll.voters.len(), 16);
    }

    #[test]
    fn test_list_by_creator_newest_first() {
        let (store, alice) = setup();
        let bob = store.create_user("bob@example.com", "hash", "bob").unwrap();

        let first = store.create_poll(&alice, &draft("first", Visibility::Private)).unwrap();
        let second = store.create_poll(&alice, &draft("second", Visibility::Public)).unwrap();
        store.create_poll(&bob, &draft("bobs", Visibility::Public)).unwrap();

        let mine = store.list_polls_by_creator(&alice.id).unwrap();
        let ids: Vec<_> = mine.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_public_feed_filters_and_limits() {
        let (store, user) = setup();
        store.create_poll(&user, &draft("hidden", Visibility::Private)).unwrap();
        store.create_poll(&user, &draft("one", Visibility::Public)).unwrap();
        store.create_poll(&user, &draft("two", Visibility::Public)).unwrap();

        let feed = store.list_public_polls(10).unwrap();
        let questions: Vec<_> = feed.iter().map(|p| p.question.as_str()).collect();
        assert_eq!(questions, vec!["two", "one"]);

        assert_eq!(store.list_public_polls(1).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_poll_owner_only() {
        let (store, alice) = setup();
        let bob = store.create_user("bob@example.com", "hash", "bob").unwrap();
        let poll = store.create_poll(&alice, &draft("Q", Visibility::Public)).unwrap();
        store.record_vote(&poll.id, 0, "1.2.3.4").unwrap();

        assert!(matches!(
            store.delete_poll(&poll.id, &bob.id),
            Err(StoreError::Forbidden)
        ));

        let deleted = store.delete_poll(&poll.id, &alice.id).unwrap();
        assert_eq!(deleted.id, poll.id);
        assert!(store.get_poll(&poll.id).unwrap().is_none());
        assert_eq!(store.voted_option(&poll.id, "1.2.3.4").unwrap(), None);

        assert!(matches!(
            store.delete_poll(&poll.id, &alice.id),
            Err(StoreError::PollNotFound(_))
        ));
    }

    #[test]
    fn test_count_polls() {
        let (store, alice) = setup();
        let bob = store.create_user("bob@example.com", "hash", "bob").unwrap();

        let p = store.create_poll(&alice, &draft("a", Visibility::Public)).unwrap();
        store.create_poll(&alice, &draft("b", Visibility::Private)).unwrap();
        store.create_poll(&bob, &draft("c", Visibility::Public)).unwrap();
        store.record_vote(&p.id, 0, "x").unwrap();
        store.record_vote(&p.id, 1, "y").unwrap();

        let all = store.count_polls(None).unwrap();
        assert_eq!(
            all,
            PollCounts {
                total: 3,
                public: 2,
                private: 1,
                votes: 2
            }
        );

        let alices = store.count_polls(Some(&alice.id)).unwrap();
        assert_eq!(alices.total, 2);
        assert_eq!(alices.public, 1);
        assert_eq!(alices.votes, 2);

        let bobs = store.count_polls(Some(&bob.id)).unwrap();
        assert_eq!(bobs.votes, 0);
    }
}
