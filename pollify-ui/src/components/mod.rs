//! UI Components
//!
//! Reusable Leptos components shared by the pages.

pub mod confirm;
pub mod loading;
pub mod nav;
pub mod poll_card;
pub mod toast;

pub use confirm::ConfirmDialog;
pub use loading::Loading;
pub use nav::Nav;
pub use poll_card::PollCard;
pub use toast::Toast;
