//! My Polls page
//!
//! The signed-in user's polls with share and delete controls.

use leptos::*;
use leptos_router::*;

use crate::api::{self, PollSummary};
use crate::components::{Loading, PollCard};
use crate::pages::require_login;
use crate::share::copy_to_clipboard;
use crate::state::GlobalState;

#[component]
pub fn MyPolls() -> impl IntoView {
    require_login();

    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let polls = create_resource(
        move || state.user.get().map(|u| u.id),
        |user| async move {
            match user {
                Some(_) => api::my_polls().await,
                None => Ok(Vec::new()),
            }
        },
    );

    view! {
        <div class="space-y-6">
            <div class="flex items-center justify-between">
                <h1 class="text-3xl font-bold">"My Polls"</h1>
                <A href="/create" class="px-4 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors">
                    "Create Poll"
                </A>
            </div>

            <Suspense fallback=|| view! { <Loading /> }>
                {move || polls.get().map(|result| match result {
                    Ok(list) if list.is_empty() => view! {
                        <p class="text-gray-400">"You haven't created any polls yet."</p>
                    }.into_view(),
                    Ok(list) => list
                        .into_iter()
                        .map(|poll| view! { <OwnedPoll poll=poll on_deleted=move || polls.refetch() /> })
                        .collect_view(),
                    Err(e) => view! { <p class="text-red-400">{e}</p> }.into_view(),
                })}
            </Suspense>
        </div>
    }
}

#[component]
fn OwnedPoll(poll: PollSummary, on_deleted: impl Fn() + Clone + 'static) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let share_path = poll.share_path.clone();
    let state_for_share = state.clone();
    let share = move |_| {
        let url = api::share_url(&share_path);
        let state = state_for_share.clone();
        spawn_local(async move {
            match copy_to_clipboard(&url).await {
                Ok(()) => state.show_success("Link copied to clipboard!"),
                Err(e) => state.show_error(&e),
            }
        });
    };

    let id = poll.id.clone();
    let state_for_delete = state.clone();
    let delete = move |_| {
        let id = id.clone();
        let state = state_for_delete.clone();
        let on_deleted = on_deleted.clone();
        state_for_delete.ask_confirm(
            "Are you sure you want to delete this poll?",
            "Delete",
            Callback::new(move |_| {
                let id = id.clone();
                let state = state.clone();
                let on_deleted = on_deleted.clone();
                spawn_local(async move {
                    match api::delete_poll(&id).await {
                        Ok(()) => {
                            state.show_success("Poll deleted successfully");
                            on_deleted();
                        }
                        Err(e) => state.show_error(&format!("Failed to delete poll: {}", e)),
                    }
                });
            }),
        );
    };

    let href = poll.share_path.clone();

    view! {
        <PollCard poll=poll>
            <div class="flex space-x-2 pt-2">
                <A href=href class="px-3 py-1 bg-gray-700 hover:bg-gray-600 rounded text-sm">"View"</A>
                <button on:click=share class="px-3 py-1 bg-gray-700 hover:bg-gray-600 rounded text-sm">"Share"</button>
                <button on:click=delete class="px-3 py-1 bg-red-700 hover:bg-red-600 rounded text-sm">"Delete"</button>
            </div>
        </PollCard>
    }
}
