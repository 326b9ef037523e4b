//! Voter identity
//!
//! A vote is deduplicated by the voter's IP address. The address is derived
//! on the server from the connection (or from proxy headers when configured)
//! and never taken from the request body.
//!
//! When the derived address is loopback or private and
//! `voter.public_ip_fallback` is on, the server's own public address is used,
//! so a single-machine setup behaves like a browser asking ipify "who am I".

pub mod lookup;

pub use lookup::{IpLookup, IpifyLookup};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;

use crate::api::{ApiError, AppState};
use crate::config::VoterConfig;

/// Errors resolving a voter address
#[derive(Error, Debug)]
pub enum VoterError {
    #[error("Could not determine your IP address")]
    Unknown,

    #[error("Public IP lookup failed: {0}")]
    Lookup(String),

    #[error("Public IP lookup returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Where the voter address comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoterIpSource {
    /// The TCP peer address
    #[default]
    Peer,
    /// `X-Forwarded-For` / `X-Real-IP`, for deployments behind a trusted proxy
    Forwarded,
}

impl fmt::Display for VoterIpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoterIpSource::Peer => f.write_str("peer"),
            VoterIpSource::Forwarded => f.write_str("forwarded"),
        }
    }
}

impl std::str::FromStr for VoterIpSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "peer" => Ok(VoterIpSource::Peer),
            "forwarded" => Ok(VoterIpSource::Forwarded),
            other => Err(format!(
                "unknown voter IP source '{}', expected peer or forwarded",
                other
            )),
        }
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}

/// The client address as seen through the configured source
pub fn client_ip(
    source: VoterIpSource,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Option<IpAddr> {
    let ip = match source {
        VoterIpSource::Peer => peer.map(|p| p.ip()),
        VoterIpSource::Forwarded => header_ip(headers, "x-forwarded-for")
            .or_else(|| header_ip(headers, "x-real-ip"))
            .or_else(|| peer.map(|p| p.ip())),
    }?;

    Some(normalize(ip))
}

/// Fold IPv4-mapped IPv6 addresses back to IPv4
fn normalize(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

/// Loopback, private, link-local or unspecified
pub fn is_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Turns a request into the voter key
pub struct VoterResolver {
    config: VoterConfig,
    lookup: Arc<dyn IpLookup>,
}

impl VoterResolver {
    pub fn new(config: VoterConfig, lookup: Arc<dyn IpLookup>) -> Self {
        Self { config, lookup }
    }

    pub fn source(&self) -> VoterIpSource {
        self.config.ip_source
    }

    pub async fn resolve(
        &self,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> Result<IpAddr, VoterError> {
        let ip = client_ip(self.config.ip_source, headers, peer);

        match ip {
            Some(ip) if !is_local(&ip) => Ok(ip),
            _ if !self.config.public_ip_fallback => ip.ok_or(VoterError::Unknown),
            _ => match self.lookup.public_ip().await {
                Ok(public) => Ok(public),
                Err(e) => {
                    tracing::warn!(error = %e, "Public IP fallback failed");
                    ip.ok_or(e)
                }
            },
        }
    }
}

/// The resolved voter address for this request
#[derive(Debug, Clone)]
pub struct VoterIp(pub IpAddr);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for VoterIp {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let ip = state.voter.resolve(&parts.headers, peer).await?;
        Ok(VoterIp(ip))
    }
}
