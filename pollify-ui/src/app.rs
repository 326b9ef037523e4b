//! App Root Component
//!
//! Routing, global providers, and the session check on load.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::components::{ConfirmDialog, Nav, Toast};
use crate::pages::{CreatePoll, Home, Login, MyPolls, PollPage, PublicFeed, Signup};
use crate::state::{init_websocket, provide_global_state};

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    let state = provide_global_state();

    // Restore the signed-in user from the stored token
    let user = state.user;
    let auth_ready = state.auth_ready;
    spawn_local(async move {
        user.set(api::current_user().await);
        auth_ready.set(true);
    });

    let ws = init_websocket(state.clone(), &api::get_api_base());
    provide_context(ws);

    view! {
        <Router>
            <div class="min-h-screen bg-gray-900 text-white flex flex-col">
                <Nav />

                <main class="flex-1 container mx-auto px-4 py-8">
                    <Routes>
                        <Route path="/" view=Home />
                        <Route path="/login" view=Login />
                        <Route path="/signup" view=Signup />
                        <Route path="/create" view=CreatePoll />
                        <Route path="/mypolls" view=MyPolls />
                        <Route path="/poll/:id" view=PollPage />
                        <Route path="/feed" view=PublicFeed />
                        <Route path="/*any" view=NotFound />
                    </Routes>
                </main>

                <LiveIndicator />
                <ConfirmDialog />
                <Toast />
            </div>
        </Router>
    }
}

/// Small badge showing whether live updates are flowing
#[component]
fn LiveIndicator() -> impl IntoView {
    let state = use_context::<crate::state::GlobalState>().expect("GlobalState not found");

    view! {
        <div class="fixed bottom-6 left-4 text-xs">
            {move || if state.ws_connected.get() {
                view! {
                    <span class="flex items-center space-x-1 text-green-400">
                        <span class="w-2 h-2 bg-green-400 rounded-full pulse" />
                        <span>"Live"</span>
                    </span>
                }.into_view()
            } else {
                view! {
                    <span class="flex items-center space-x-1 text-gray-500">
                        <span class="w-2 h-2 bg-gray-500 rounded-full" />
                        <span>"Offline"</span>
                    </span>
                }.into_view()
            }}
        </div>
    }
}

/// 404 Not Found page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-[60vh] text-center">
            <div class="text-6xl mb-4">"🔍"</div>
            <h1 class="text-3xl font-bold mb-2">"Page Not Found"</h1>
            <p class="text-gray-400 mb-6">"The page you're looking for doesn't exist."</p>
            <A
                href="/"
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
            >
                "Go Home"
            </A>
        </div>
    }
}
