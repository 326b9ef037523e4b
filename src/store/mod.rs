//! Pollify Store
//!
//! SQLite-backed persistence for polls, accounts and sessions:
//!
//! - **types**: Core data structures (Poll, PollDraft, User, Session)
//! - **polls**: Poll create / read / query / vote / delete
//! - **users**: Accounts and bearer sessions
//! - **error**: Error types
//!
//! # Schema
//!
//! ```text
//! users       (id, email UNIQUE, password_hash, display_name, created_at)
//! sessions    (token, user_id → users, created_at, expires_at)
//! polls       (id, question, description, options JSON, votes JSON,
//!              created_by → users, creator_name, visibility, created_at)
//! poll_votes  (poll_id → polls, voter, option_index, voted_at)
//!              PRIMARY KEY (poll_id, voter)
//! ```
//!
//! Votes are recorded inside an IMMEDIATE transaction, so the count update and
//! the voter insert either both land or neither does, and concurrent voters
//! serialize on the database write lock.
//!
//! # Example
//!
//! ```rust,no_run
//! use pollify::store::{PollDraft, Store, StoreConfig, Visibility};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::open(&StoreConfig::new("./data"))?;
//!
//!     let user = store.create_user("alice@example.com", "<phc hash>", "alice")?;
//!     let poll = store.create_poll(
//!         &user,
//!         &PollDraft::new("Tabs or spaces?")
//!             .option("Tabs")
//!             .option("Spaces")
//!             .visibility(Visibility::Public),
//!     )?;
//!
//!     store.record_vote(&poll.id, 1, "203.0.113.7")?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod polls;
pub mod types;
pub mod users;

pub use error::{StoreError, StoreResult};
pub use types::{
    Poll, PollCounts, PollDraft, PollId, Session, User, ValidPoll, Visibility,
};

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Configuration for the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for the database file
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("pollify_data"),
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path to the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("pollify.db")
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    display_name  TEXT NOT NULL,
    created_at    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

CREATE TABLE IF NOT EXISTS polls (
    id           TEXT PRIMARY KEY,
    question     TEXT NOT NULL,
    description  TEXT,
    options      TEXT NOT NULL,
    votes        TEXT NOT NULL,
    created_by   TEXT NOT NULL,
    creator_name TEXT NOT NULL,
    visibility   TEXT NOT NULL CHECK (visibility IN ('public', 'private')),
    created_at   INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_polls_creator ON polls(created_by, created_at);
CREATE INDEX IF NOT EXISTS idx_polls_feed ON polls(visibility, created_at);

CREATE TABLE IF NOT EXISTS poll_votes (
    poll_id      TEXT NOT NULL REFERENCES polls(id) ON DELETE CASCADE,
    voter        TEXT NOT NULL,
    option_index INTEGER NOT NULL,
    voted_at     INTEGER NOT NULL,
    PRIMARY KEY (poll_id, voter)
);
";

/// The Pollify store
///
/// Wraps a single SQLite connection behind a mutex; every public operation
/// takes the lock for its whole duration.
pub struct Store {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Store {
    /// Create or open the database under `config.data_dir`
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let path = config.db_path();

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;

        let store = Self::init(conn, Some(path))?;
        tracing::info!(path = ?store.path, "Opened poll store");
        Ok(store)
    }

    /// Open a throwaway in-memory database
    pub fn in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Cheap round-trip used by readiness probes
    pub fn ping(&self) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_database_file() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("nested"));

        let store = Store::open(&config).unwrap();
        assert!(config.db_path().exists());
        assert_eq!(store.path(), Some(config.db_path().as_path()));
        store.ping().unwrap();
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());

        let poll_id = {
            let store = Store::open(&config).unwrap();
            let user = store.create_user("a@b.co", "hash", "a").unwrap();
            let draft = PollDraft::new("Q").option("x").option("y");
            store.create_poll(&user, &draft).unwrap().id
        };

        let store = Store::open(&config).unwrap();
        let poll = store.get_poll(&poll_id).unwrap().unwrap();
        assert_eq!(poll.question, "Q");
        assert_eq!(poll.votes, vec![0, 0]);
    }

    #[test]
    fn test_in_memory() {
        let store = Store::in_memory().unwrap();
        assert!(store.path().is_none());
        store.ping().unwrap();
    }
}
