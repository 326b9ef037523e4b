//! Navigation Component
//!
//! Header bar. Links depend on whether someone is signed in.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::state::GlobalState;

/// Navigation header component
#[component]
pub fn Nav() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let navigate = use_navigate();

    let state_for_logout = state.clone();
    let logout = move |_| {
        let state = state_for_logout.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            match api::logout().await {
                Ok(()) => state.show_success("Logged out successfully"),
                Err(e) => state.show_error(&format!("Logout failed: {}", e)),
            }
            state.user.set(None);
            navigate("/", Default::default());
        });
    };

    view! {
        <nav class="bg-gray-800 border-b border-gray-700">
            <div class="container mx-auto px-4">
                <div class="flex items-center justify-between h-16">
                    <A href="/" class="flex items-center space-x-3">
                        <span class="text-2xl">"🗳"</span>
                        <span class="text-xl font-bold text-white">"Pollify"</span>
                    </A>

                    <div class="flex items-center space-x-1">
                        <NavLink href="/feed" label="Public Polls" />
                        <Show
                            when=move || state.user.get().is_some()
                            fallback=|| view! {
                                <NavLink href="/login" label="Login" />
                                <NavLink href="/signup" label="Sign Up" />
                            }
                        >
                            <NavLink href="/create" label="Create Poll" />
                            <NavLink href="/mypolls" label="My Polls" />
                            <button
                                on:click=logout.clone()
                                class="px-4 py-2 rounded-lg text-gray-300 hover:text-white hover:bg-gray-700 transition-colors"
                            >
                                "Logout"
                            </button>
                        </Show>
                    </div>
                </div>
            </div>
        </nav>
    }
}

/// Individual navigation link
#[component]
fn NavLink(href: &'static str, label: &'static str) -> impl IntoView {
    view! {
        <A
            href=href
            class="px-4 py-2 rounded-lg text-gray-300 hover:text-white hover:bg-gray-700 transition-colors"
            active_class="bg-gray-700 text-white"
        >
            {label}
        </A>
    }
}
