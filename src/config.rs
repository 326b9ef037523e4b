//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `POLLIFY_*` environment variable overrides.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::voter::VoterIpSource;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub voter: VoterConfig,

    #[serde(default)]
    pub websocket: WebSocketConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database location
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("pollify").to_string_lossy().to_string())
        .unwrap_or_else(|| "./pollify_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed browser origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_max_body_size() -> usize {
    64 * 1024
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:8091".to_string(),
                "http://127.0.0.1:8091".to_string(),
            ],
            max_body_size: default_max_body_size(),
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Account and session settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: i64,

    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,

    #[serde(default = "default_purge_interval")]
    pub session_purge_interval_secs: u64,

    /// Mark the session cookie `Secure` (serve over HTTPS)
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_session_ttl() -> i64 {
    24 * 7
}

fn default_min_password_len() -> usize {
    6
}

fn default_purge_interval() -> u64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl(),
            min_password_len: default_min_password_len(),
            session_purge_interval_secs: default_purge_interval(),
            secure_cookie: false,
        }
    }
}

/// How the voter identity is derived from a request
#[derive(Debug, Clone, Deserialize)]
pub struct VoterConfig {
    #[serde(default)]
    pub ip_source: VoterIpSource,

    /// Replace loopback/private addresses with the server's public IP
    #[serde(default = "default_public_ip_fallback")]
    pub public_ip_fallback: bool,

    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
}

fn default_public_ip_fallback() -> bool {
    true
}

fn default_ip_lookup_url() -> String {
    "https://api.ipify.org?format=json".to_string()
}

fn default_lookup_timeout() -> u64 {
    5
}

impl Default for VoterConfig {
    fn default() -> Self {
        Self {
            ip_source: VoterIpSource::default(),
            public_ip_fallback: default_public_ip_fallback(),
            ip_lookup_url: default_ip_lookup_url(),
            lookup_timeout_secs: default_lookup_timeout(),
        }
    }
}

/// Live update hub limits
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Frames buffered per connection before new ones are dropped
    #[serde(default = "default_send_queue_capacity")]
    pub send_queue_capacity: usize,

    /// Distinct topics one connection may subscribe to
    #[serde(default = "default_max_topics")]
    pub max_topics_per_connection: usize,
}

fn default_max_connections() -> usize {
    1000
}

fn default_send_queue_capacity() -> usize {
    256
}

fn default_max_topics() -> usize {
    64
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            send_queue_capacity: default_send_queue_capacity(),
            max_topics_per_connection: default_max_topics(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("pollify").join("config.toml")),
            Some(PathBuf::from("/etc/pollify/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Socket address the API binds to
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = self.api.addr();
        addr.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "api.host/api.port do not form a socket address: {}",
                addr
            ))
        })
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `POLLIFY_*` overrides using `lookup` to read variables
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(data_dir) = lookup("POLLIFY_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        if let Some(host) = lookup("POLLIFY_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("POLLIFY_API_PORT").and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }

        if let Some(source) = lookup("POLLIFY_VOTER_IP_SOURCE") {
            match source.parse() {
                Ok(source) => self.voter.ip_source = source,
                Err(e) => tracing::warn!("Ignoring POLLIFY_VOTER_IP_SOURCE: {}", e),
            }
        }
        if let Some(url) = lookup("POLLIFY_IP_LOOKUP_URL") {
            self.voter.ip_lookup_url = url;
        }

        if let Some(ttl) = lookup("POLLIFY_SESSION_TTL_HOURS").and_then(|t| t.parse().ok()) {
            self.auth.session_ttl_hours = ttl;
        }

        if let Some(level) = lookup("POLLIFY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("POLLIFY_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Pollify Configuration
#
# Environment variables override these settings:
# - POLLIFY_DATA_DIR
# - POLLIFY_API_HOST
# - POLLIFY_API_PORT
# - POLLIFY_VOTER_IP_SOURCE
# - POLLIFY_IP_LOOKUP_URL
# - POLLIFY_SESSION_TTL_HOURS
# - POLLIFY_LOG_LEVEL
# - POLLIFY_LOG_FORMAT

[storage]
# Directory holding pollify.db
data_dir = "~/.local/share/pollify"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Allowed CORS origins (empty list allows any origin)
cors_origins = ["http://localhost:8091", "http://127.0.0.1:8091"]

# Maximum request body size in bytes
max_body_size = 65536

[auth]
# How long a login stays valid (hours)
session_ttl_hours = 168

# Minimum password length accepted at sign-up
min_password_len = 6

# How often expired sessions are purged (seconds)
session_purge_interval_secs = 3600

# Set the Secure flag on the session cookie
secure_cookie = false

[voter]
# Where the voter IP comes from: "peer" (socket address) or
# "forwarded" (X-Forwarded-For / X-Real-IP, behind a trusted proxy)
ip_source = "peer"

# Use the server's public IP when the voter address is loopback or private
public_ip_fallback = true

# ipify-compatible endpoint returning {"ip": "..."}
ip_lookup_url = "https://api.ipify.org?format=json"
lookup_timeout_secs = 5

[websocket]
max_connections = 1000
send_queue_capacity = 256
max_topics_per_connection = 64

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.auth.session_ttl_hours, 168);
        assert_eq!(config.auth.min_password_len, 6);
        assert_eq!(config.voter.ip_source, VoterIpSource::Peer);
        assert!(config.voter.public_ip_fallback);
        assert_eq!(config.websocket.max_connections, 1000);
    }

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8090);
        assert_eq!(config.api.max_body_size, 65536);
        assert_eq!(config.voter.ip_source, VoterIpSource::Peer);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.websocket.max_topics_per_connection, 64);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = Config::parse(
            r#"
            [voter]
            ip_source = "forwarded"

            [api]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(config.voter.ip_source, VoterIpSource::Forwarded);
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.auth.session_ttl_hours, 168);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("POLLIFY_DATA_DIR", "/tmp/polls"),
            ("POLLIFY_API_PORT", "7000"),
            ("POLLIFY_VOTER_IP_SOURCE", "forwarded"),
            ("POLLIFY_SESSION_TTL_HOURS", "not-a-number"),
            ("POLLIFY_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.storage.data_dir, "/tmp/polls");
        assert_eq!(config.api.port, 7000);
        assert_eq!(config.voter.ip_source, VoterIpSource::Forwarded);
        assert_eq!(config.auth.session_ttl_hours, 168);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nhost = \"127.0.0.1\"\nport = 8123\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8123");

        std::fs::write(&path, "[api\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
