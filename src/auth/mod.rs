//! Accounts and sessions
//!
//! - **password**: Argon2id hashing and credential rules
//! - **extract**: axum extractors resolving the caller's session
//!
//! Sessions are opaque bearer tokens stored server-side. Browsers receive the
//! token both in the response body and as the `pollify_session` cookie.

pub mod extract;
pub mod password;

pub use extract::{
    clear_session_cookie, session_cookie, session_token, AuthUser, MaybeUser, SESSION_COOKIE,
};
pub use password::{
    display_name_for, hash_password, validate_credentials, verify_decoy, verify_password,
};

use std::sync::Arc;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::store::{Session, Store, StoreError, StoreResult, User};

/// Errors from sign-up, sign-in and session lookup
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    /// Unknown e-mail or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailTaken,

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Sign-up / sign-in / sign-out on top of the store
#[derive(Clone)]
pub struct AuthService {
    store: Arc<Store>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(store: Arc<Store>, config: AuthConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.config.session_ttl_hours)
    }

    /// Run a store call on the blocking pool; the connection mutex may be
    /// held by a vote transaction.
    async fn blocking<T, F>(&self, op: F) -> AuthResult<T>
    where
        F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| AuthError::Task(e.to_string()))?
            .map_err(AuthError::from)
    }

    /// Create an account and open its first session
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<(User, Session)> {
        validate_credentials(email, password, self.config.min_password_len)?;

        let password = password.to_string();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Task(e.to_string()))??;

        let email = email.to_string();
        let display_name = display_name_for(&email);
        let ttl = self.ttl();
        let created = self
            .blocking(move |store| {
                let user = store.create_user(&email, &hash, &display_name)?;
                let session = store.create_session(&user.id, ttl)?;
                Ok((user, session))
            })
            .await;

        match created {
            Err(AuthError::Store(StoreError::EmailTaken(_))) => Err(AuthError::EmailTaken),
            other => other,
        }
    }

    /// Verify credentials and open a session.
    ///
    /// Unknown e-mails still cost one Argon2 verification.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<(User, Session)> {
        let lookup = email.to_string();
        let found = self
            .blocking(move |store| store.find_user_by_email(&lookup))
            .await?;

        let password = password.to_string();
        let (user, verified) = tokio::task::spawn_blocking(move || match found {
            Some((user, hash)) => {
                let verified = verify_password(&password, &hash);
                (Some(user), verified)
            }
            None => (None, verify_decoy(&password)),
        })
        .await
        .map_err(|e| AuthError::Task(e.to_string()))?;

        let Some(user) = user else {
            tracing::debug!("Sign-in for unknown e-mail");
            return Err(AuthError::InvalidCredentials);
        };
        if !verified {
            tracing::debug!(user_id = %user.id, "Sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let user_id = user.id.clone();
        let ttl = self.ttl();
        let session = self
            .blocking(move |store| store.create_session(&user_id, ttl))
            .await?;
        tracing::info!(user_id = %user.id, "User signed in");
        Ok((user, session))
    }

    /// Revoke a session token. Unknown tokens are not an error.
    pub async fn sign_out(&self, token: &str) -> AuthResult<()> {
        let token = token.to_string();
        if self.blocking(move |store| store.delete_session(&token)).await? {
            tracing::info!("Session revoked");
        }
        Ok(())
    }

    /// Resolve a token to its user
    pub async fn current_user(&self, token: &str) -> AuthResult<User> {
        let token = token.to_string();
        self.blocking(move |store| store.session_user(&token))
            .await?
            .ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        let store = Arc::new(Store::in_memory().unwrap());
        AuthService::new(store, AuthConfig::default())
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let auth = service();

        let (user, session) = auth.sign_up("heidi@example.com", "secret1").await.unwrap();
        assert_eq!(user.display_name, "heidi");
        assert_eq!(auth.current_user(&session.token).await.unwrap(), user);

        let (again, second) = auth.sign_in("heidi@example.com", "secret1").await.unwrap();
        assert_eq!(again.id, user.id);
        assert_ne!(second.token, session.token);
    }

    #[tokio::test]
    async fn test_sign_up_rejects_duplicates_and_bad_input() {
        let auth = service();
        auth.sign_up("ivan@example.com", "secret1").await.unwrap();

        assert!(matches!(
            auth.sign_up("ivan@example.com", "secret2").await,
            Err(AuthError::EmailTaken)
        ));
        assert!(matches!(
            auth.sign_up("not-an-email", "secret1").await,
            Err(AuthError::InvalidEmail)
        ));
        assert!(matches!(
            auth.sign_up("judy@example.com", "123").await,
            Err(AuthError::PasswordTooShort(6))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_generic() {
        let auth = service();
        auth.sign_up("kim@example.com", "secret1").await.unwrap();

        let wrong_password = auth.sign_in("kim@example.com", "nope").await.unwrap_err();
        let unknown_user = auth.sign_in("lee@example.com", "secret1").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_session() {
        let auth = service();
        let (_, session) = auth.sign_up("mia@example.com", "secret1").await.unwrap();

        auth.sign_out(&session.token).await.unwrap();
        assert!(matches!(
            auth.current_user(&session.token).await,
            Err(AuthError::Unauthenticated)
        ));
        auth.sign_out(&session.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_session_lookup_does_not_block_the_runtime() {
        use std::time::{Duration, Instant};

        let store = Arc::new(Store::in_memory().unwrap());
        let auth = AuthService::new(Arc::clone(&store), AuthConfig::default());
        let (_, session) = auth.sign_up("noor@example.com", "secret1").await.unwrap();

        // Another thread holds the connection, as a long vote transaction would
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let holder = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let _conn = store.lock().unwrap();
                locked_tx.send(()).unwrap();
                std::thread::sleep(Duration::from_millis(400));
            })
        };
        locked_rx.recv().unwrap();

        let started = Instant::now();
        let token = session.token.clone();
        let lookup = tokio::spawn(async move { auth.current_user(&token).await });

        // On this single-threaded runtime the timer only fires if the lookup yields
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(started.elapsed() < Duration::from_millis(300));

        assert_eq!(lookup.await.unwrap().unwrap().email, "noor@example.com");
        holder.join().unwrap();
    }
}
