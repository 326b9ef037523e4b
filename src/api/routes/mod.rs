//! API route handlers

pub mod auth;
pub mod feed;
pub mod health;
pub mod polls;
pub mod stats;
pub mod votes;
