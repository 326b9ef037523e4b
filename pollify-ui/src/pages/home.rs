//! Landing page

use leptos::*;
use leptos_router::*;

use crate::state::GlobalState;

#[component]
pub fn Home() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <div class="flex flex-col items-center justify-center min-h-[60vh] text-center space-y-6">
            <h1 class="text-4xl font-bold">"Welcome to Pollify"</h1>
            <p class="text-gray-400 max-w-lg">
                "Create a poll, share the link, and watch the votes come in live."
            </p>
            <div class="flex space-x-3">
                <Show
                    when=move || state.user.get().is_some()
                    fallback=|| view! {
                        <A href="/signup" class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors">
                            "Get Started"
                        </A>
                    }
                >
                    <A href="/create" class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors">
                        "Create a Poll"
                    </A>
                </Show>
                <A href="/feed" class="px-6 py-3 bg-gray-700 hover:bg-gray-600 rounded-lg font-medium transition-colors">
                    "Browse Public Polls"
                </A>
            </div>
        </div>
    }
}
