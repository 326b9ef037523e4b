//! Confirmation dialog
//!
//! Rendered once at the app root; pages open it through
//! `GlobalState::ask_confirm`.

use leptos::*;

use crate::state::GlobalState;

#[component]
pub fn ConfirmDialog() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let confirm = state.confirm;

    let cancel = move |_| confirm.set(None);
    let accept = move |_| {
        if let Some(request) = confirm.get_untracked() {
            confirm.set(None);
            request.on_confirm.call(());
        }
    };

    view! {
        {move || confirm.get().map(|request| view! {
            <div class="fixed inset-0 z-40 bg-black/60 flex items-center justify-center">
                <div class="bg-gray-800 rounded-xl p-6 w-full max-w-sm shadow-xl">
                    <p class="text-lg mb-6">{request.message}</p>
                    <div class="flex justify-end space-x-2">
                        <button
                            on:click=cancel
                            class="px-4 py-2 bg-gray-600 hover:bg-gray-500 rounded-lg font-medium transition-colors"
                        >
                            "Cancel"
                        </button>
                        <button
                            on:click=accept
                            class="px-4 py-2 bg-red-600 hover:bg-red-700 rounded-lg font-medium transition-colors"
                        >
                            {request.confirm_label}
                        </button>
                    </div>
                </div>
            </div>
        })}
    }
}
