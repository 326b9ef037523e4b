//! Public IP lookup
//!
//! Asks an ipify-compatible service (`{"ip": "..."}`) which address this
//! machine appears as on the internet.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::VoterError;

/// How long a looked-up address is reused
const CACHE_TTL: Duration = Duration::from_secs(600);

/// Source of the server's public address
#[async_trait]
pub trait IpLookup: Send + Sync {
    async fn public_ip(&self) -> Result<IpAddr, VoterError>;
}

#[derive(Debug, Deserialize)]
struct IpifyResponse {
    ip: String,
}

/// Lookup against an ipify-compatible HTTP endpoint, cached for ten minutes
pub struct IpifyLookup {
    client: Client,
    url: String,
    cached: RwLock<Option<(IpAddr, Instant)>>,
}

impl IpifyLookup {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, VoterError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VoterError::Lookup(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            cached: RwLock::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<IpAddr, VoterError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| VoterError::Lookup(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VoterError::Lookup(format!(
                "{} returned {}",
                self.url,
                response.status()
            )));
        }

        let body: IpifyResponse = response
            .json()
            .await
            .map_err(|e| VoterError::InvalidResponse(e.to_string()))?;

        parse_ip(&body.ip)
    }
}

#[async_trait]
impl IpLookup for IpifyLookup {
    async fn public_ip(&self) -> Result<IpAddr, VoterError> {
        if let Some((ip, fetched_at)) = *self.cached.read().await {
            if fetched_at.elapsed() < CACHE_TTL {
                return Ok(ip);
            }
        }

        let ip = self.fetch().await?;
        tracing::debug!(%ip, url = %self.url, "Resolved public IP");
        *self.cached.write().await = Some((ip, Instant::now()));
        Ok(ip)
    }
}

fn parse_ip(raw: &str) -> Result<IpAddr, VoterError> {
    raw.trim()
        .parse()
        .map_err(|_| VoterError::InvalidResponse(format!("not an IP address: {}", raw)))
}

/// Lookup returning a fixed answer
#[cfg(test)]
pub(crate) struct FixedLookup(pub Option<IpAddr>);

#[cfg(test)]
#[async_trait]
impl IpLookup for FixedLookup {
    async fn public_ip(&self) -> Result<IpAddr, VoterError> {
        self.0
            .ok_or_else(|| VoterError::Lookup("lookup disabled".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipify_body() {
        let body: IpifyResponse = serde_json::from_str(r#"{"ip":"198.51.100.4"}"#).unwrap();
        assert_eq!(
            parse_ip(&body.ip).unwrap(),
            "198.51.100.4".parse::<IpAddr>().unwrap()
        );
        assert!(matches!(
            parse_ip("nope"),
            Err(VoterError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_lookup_errors() {
        let lookup = IpifyLookup::new("http://127.0.0.1:9/", Duration::from_millis(500)).unwrap();
        assert!(matches!(lookup.public_ip().await, Err(VoterError::Lookup(_))));
    }
}
