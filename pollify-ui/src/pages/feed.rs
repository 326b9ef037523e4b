//! Public polls feed

use leptos::*;

use crate::api;
use crate::components::{Loading, PollCard};
use crate::state::websocket::FEED_TOPIC;
use crate::state::{GlobalState, WebSocketClient};

#[component]
pub fn PublicFeed() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    // Refetch whenever the server announces a new or deleted public poll
    let polls = create_resource(
        move || state.feed_changes.get(),
        |_| async move { api::public_feed().await },
    );

    if let Some(ws) = use_context::<WebSocketClient>() {
        ws.watch(FEED_TOPIC.to_string());
        on_cleanup(move || ws.unwatch(FEED_TOPIC));
    }

    view! {
        <div class="space-y-6">
            <h1 class="text-3xl font-bold">"Public Polls"</h1>
            <Suspense fallback=|| view! { <Loading /> }>
                {move || polls.get().map(|result| match result {
                    Ok(list) if list.is_empty() => view! {
                        <p class="text-gray-400">"No public polls yet."</p>
                    }.into_view(),
                    Ok(list) => list
                        .into_iter()
                        .map(|poll| view! { <PollCard poll=poll /> })
                        .collect_view(),
                    Err(e) => view! { <p class="text-red-400">{e}</p> }.into_view(),
                })}
            </Suspense>
        </div>
    }
}
