//! Global Application State
//!
//! Reactive state management using Leptos signals.

use leptos::*;

use crate::api::UserView;

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Signed-in account, `None` when logged out
    pub user: RwSignal<Option<UserView>>,
    /// Set once the stored session has been checked
    pub auth_ready: RwSignal<bool>,
    /// WebSocket connection status
    pub ws_connected: RwSignal<bool>,
    /// Latest tally pushed by the server
    pub live_tally: RwSignal<Option<LiveTally>>,
    /// Id of the last poll the server reported deleted
    pub deleted_poll: RwSignal<Option<String>>,
    /// Bumped whenever the public feed changes
    pub feed_changes: RwSignal<u32>,
    /// Pending confirmation dialog
    pub confirm: RwSignal<Option<ConfirmRequest>>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
}

/// Vote counts for one poll, as broadcast after each vote
#[derive(Clone, Debug, PartialEq)]
pub struct LiveTally {
    pub poll_id: String,
    pub votes: Vec<u64>,
    pub total_votes: u64,
}

impl LiveTally {
    /// Counts only grow, so a tally below the shown total arrived late
    pub fn is_current_for(&self, shown_total: u64) -> bool {
        self.total_votes >= shown_total
    }
}

/// A yes/no question shown in the confirm dialog
#[derive(Clone)]
pub struct ConfirmRequest {
    pub message: String,
    pub confirm_label: String,
    pub on_confirm: Callback<()>,
}

/// Provide global state to the component tree
pub fn provide_global_state() -> GlobalState {
    let state = GlobalState {
        user: create_rw_signal(None),
        auth_ready: create_rw_signal(false),
        ws_connected: create_rw_signal(false),
        live_tally: create_rw_signal(None),
        deleted_poll: create_rw_signal(None),
        feed_changes: create_rw_signal(0),
        confirm: create_rw_signal(None),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
    };

    provide_context(state.clone());
    state
}

impl GlobalState {
    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }

    /// Ask the user to confirm before running `on_confirm`
    pub fn ask_confirm(&self, message: &str, confirm_label: &str, on_confirm: Callback<()>) {
        self.confirm.set(Some(ConfirmRequest {
            message: message.to_string(),
            confirm_label: confirm_label.to_string(),
            on_confirm,
        }));
    }
}
