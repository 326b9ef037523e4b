//! API access
//!
//! HTTP calls to the Pollify server and the session token they carry.

pub mod client;

pub use client::*;
