//! Pages
//!
//! Top-level page components for each route.

pub mod auth;
pub mod create;
pub mod feed;
pub mod home;
pub mod my_polls;
pub mod poll;

pub use auth::{require_login, Login, Signup};
pub use create::CreatePoll;
pub use feed::PublicFeed;
pub use home::Home;
pub use my_polls::MyPolls;
pub use poll::PollPage;
