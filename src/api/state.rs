//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::api::error::{ApiError, ApiResult};
use crate::auth::AuthService;
use crate::config::Config;
use crate::store::{Store, StoreResult};
use crate::voter::{IpLookup, IpifyLookup, VoterError, VoterResolver};
use crate::websocket::{ConnectionHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Poll, account and session storage
    pub store: Arc<Store>,
    /// Sign-up / sign-in over the same store
    pub auth: AuthService,
    /// Derives the voter key from each request
    pub voter: Arc<VoterResolver>,
    /// WebSocket connection hub for live poll updates
    pub hub: Arc<ConnectionHub>,
    pub config: Arc<Config>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// State backed by an ipify-compatible lookup built from `config.voter`
    pub fn new(store: Arc<Store>, config: Config) -> Result<Self, VoterError> {
        let lookup = IpifyLookup::new(
            config.voter.ip_lookup_url.clone(),
            Duration::from_secs(config.voter.lookup_timeout_secs),
        )?;
        Ok(Self::with_lookup(store, config, Arc::new(lookup)))
    }

    /// State with a caller-supplied public IP lookup
    pub fn with_lookup(store: Arc<Store>, config: Config, lookup: Arc<dyn IpLookup>) -> Self {
        let auth = AuthService::new(Arc::clone(&store), config.auth.clone());
        let voter = VoterResolver::new(config.voter.clone(), lookup);
        let hub = ConnectionHub::new(HubConfig::from(&config.websocket));

        Self {
            store,
            auth,
            voter: Arc::new(voter),
            hub: Arc::new(hub),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Run a store operation on the blocking pool
    pub async fn with_store<T, F>(&self, op: F) -> ApiResult<T>
    where
        F: FnOnce(&Store) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| ApiError::Internal(format!("Store task failed: {}", e)))?
            .map_err(ApiError::from)
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get WebSocket connection count
    pub async fn ws_connection_count(&self) -> usize {
        self.hub.connection_count().await
    }
}
