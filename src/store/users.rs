//! Accounts and sessions

use chrono::{Duration, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{from_millis, Session, User};
use crate::store::Store;

fn read_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        created_at: from_millis(row.get(3)?),
    })
}

impl Store {
    /// Register a new account. E-mails are unique case-insensitively.
    pub fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> StoreResult<User> {
        let user = User {
            id: uuid::Uuid::new_v4().simple().to_string(),
            email: email.trim().to_string(),
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        };

        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO users (id, email, password_hash, display_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id,
                user.email,
                password_hash,
                user.display_name,
                user.created_at.timestamp_millis()
            ],
        );

        match result {
            Ok(_) => {
                tracing::info!(user_id = %user.id, "Registered user");
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::EmailTaken(user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up an account and its password hash by e-mail
    pub fn find_user_by_email(&self, email: &str) -> StoreResult<Option<(User, String)>> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT id, email, display_name, created_at, password_hash
                 FROM users WHERE email = ?1",
                params![email.trim()],
                |row| Ok((read_user(row)?, row.get::<_, String>(4)?)),
            )
            .optional()?;
        Ok(found)
    }

    pub fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, email, display_name, created_at FROM users WHERE id = ?1",
                params![user_id],
                read_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Issue a session for `user_id` valid for `ttl`
    pub fn create_session(&self, user_id: &str, ttl: Duration) -> StoreResult<Session> {
        let now = Utc::now();
        let session = Session {
            token: uuid::Uuid::new_v4().simple().to_string(),
            user_id: user_id.to_string(),
            created_at: now,
            expires_at: now + ttl,
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.user_id,
                session.created_at.timestamp_millis(),
                session.expires_at.timestamp_millis()
            ],
        )?;

        Ok(session)
    }

    /// Resolve a session token to its user; expired sessions resolve to `None`
    pub fn session_user(&self, token: &str) -> StoreResult<Option<User>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT u.id, u.email, u.display_name, u.created_at
                 FROM sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1 AND s.expires_at > ?2",
                params![token, Utc::now().timestamp_millis()],
                read_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Revoke a session. Returns whether it existed.
    pub fn delete_session(&self, token: &str) -> StoreResult<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(removed > 0)
    }

    /// Drop every expired session, returning how many were removed
    pub fn purge_expired_sessions(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![Utc::now().timestamp_millis()],
        )?;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_find_user() {
        let store = Store::in_memory().unwrap();
        let user = store.create_user("Carol@Example.com", "phc", "Carol").unwrap();

        let (found, hash) = store
            .find_user_by_email("carol@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(found, user);
        assert_eq!(hash, "phc");

        assert_eq!(store.get_user(&user.id).unwrap(), Some(user));
        assert!(store.find_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = Store::in_memory().unwrap();
        store.create_user("dave@example.com", "h", "dave").unwrap();

        let err = store.create_user("DAVE@example.com", "h", "dave").unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken(_)));
    }

    #[test]
    fn test_session_lifecycle() {
        let store = Store::in_memory().unwrap();
        let user = store.create_user("erin@example.com", "h", "erin").unwrap();

        let session = store.create_session(&user.id, Duration::hours(1)).unwrap();
        assert!(!session.is_expired());
        assert_eq!(store.session_user(&session.token).unwrap(), Some(user));

        assert!(store.delete_session(&session.token).unwrap());
        assert!(store.session_user(&session.token).unwrap().is_none());
        assert!(!store.delete_session(&session.token).unwrap());
    }

    #[test]
    fn test_expired_sessions_ignored_and_purged() {
        let store = Store::in_memory().unwrap();
        let user = store.create_user("frank@example.com", "h", "frank").unwrap();

        let expired = store.create_session(&user.id, Duration::seconds(-1)).unwrap();
        let live = store.create_session(&user.id, Duration::hours(1)).unwrap();

        assert!(expired.is_expired());
        assert!(store.session_user(&expired.token).unwrap().is_none());

        assert_eq!(store.purge_expired_sessions().unwrap(), 1);
        assert!(store.session_user(&live.token).unwrap().is_some());
    }
}
