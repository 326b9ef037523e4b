//! Poll page
//!
//! Shows one poll, takes a vote, and keeps the counts live over WebSocket.

use leptos::*;
use leptos_router::*;

use crate::api::{self, PollView};
use crate::components::Loading;
use crate::share::copy_to_clipboard;
use crate::state::websocket::poll_topic;
use crate::state::{GlobalState, WebSocketClient};
use crate::validation::percent;

#[component]
pub fn PollPage() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let navigate = use_navigate();
    let params = use_params_map();
    let poll_id = move || params.with(|p| p.get("id").cloned().unwrap_or_default());

    let poll = create_rw_signal(None::<PollView>);
    let (load_error, set_load_error) = create_signal(None::<String>);
    let (voting, set_voting) = create_signal(false);

    // Load (and reload when the id in the URL changes)
    create_effect(move |_| {
        let id = poll_id();
        poll.set(None);
        set_load_error.set(None);
        spawn_local(async move {
            match api::fetch_poll(&id).await {
                Ok(view) => poll.set(Some(view)),
                Err(e) => set_load_error.set(Some(e)),
            }
        });
    });

    // Live counts
    if let Some(ws) = use_context::<WebSocketClient>() {
        let ws_for_cleanup = ws.clone();
        create_effect(move |previous: Option<String>| {
            let topic = poll_topic(&poll_id());
            if let Some(old) = previous.filter(|old| *old != topic) {
                ws.unwatch(&old);
            }
            ws.watch(topic.clone());
            topic
        });
        on_cleanup(move || ws_for_cleanup.unwatch(&poll_topic(&poll_id())));
    }

    let live_tally = state.live_tally;
    create_effect(move |_| {
        if let Some(tally) = live_tally.get() {
            poll.update(|current| {
                if let Some(p) = current
                    .as_mut()
                    .filter(|p| p.id == tally.poll_id && tally.is_current_for(p.total_votes))
                {
                    p.votes = tally.votes.clone();
                    p.total_votes = tally.total_votes;
                }
            });
        }
    });

    let state_for_delete = state.clone();
    create_effect(move |_| {
        if state_for_delete.deleted_poll.get() == Some(poll_id()) {
            state_for_delete.show_error("This poll has been deleted");
            navigate("/", Default::default());
        }
    });

    let state_for_vote = state.clone();
    let cast_vote = move |option: usize| {
        let id = poll_id();
        let state = state_for_vote.clone();
        set_voting.set(true);
        spawn_local(async move {
            match api::vote(&id, option).await {
                Ok(mut view) => {
                    // A pushed tally may already be ahead of this response
                    poll.update(|current| {
                        if let Some(shown) = current
                            .as_ref()
                            .filter(|p| p.id == view.id && p.total_votes > view.total_votes)
                        {
                            view.votes = shown.votes.clone();
                            view.total_votes = shown.total_votes;
                        }
                        *current = Some(view);
                    });
                    state.show_success("Vote recorded!");
                }
                Err(e) => state.show_error(&e),
            }
            set_voting.set(false);
        });
    };

    let share = move |_| {
        let Some(path) = poll.with_untracked(|p| p.as_ref().map(|p| p.share_path.clone())) else {
            return;
        };
        let url = api::share_url(&path);
        let state = state.clone();
        spawn_local(async move {
            match copy_to_clipboard(&url).await {
                Ok(()) => state.show_success("Link copied to clipboard!"),
                Err(e) => state.show_error(&e),
            }
        });
    };

    view! {
        <div class="max-w-2xl mx-auto">
            {move || match (poll.get(), load_error.get()) {
                (_, Some(e)) => view! {
                    <div class="text-center space-y-4">
                        <p class="text-red-400">{e}</p>
                        <A href="/" class="text-primary-400 hover:underline">"Back home"</A>
                    </div>
                }.into_view(),
                (None, None) => view! { <Loading /> }.into_view(),
                (Some(p), None) => {
                    let cast_vote = cast_vote.clone();
                    view! {
                        <div class="bg-gray-800 rounded-xl p-8 space-y-6">
                            <div>
                                <h1 class="text-2xl font-bold">{p.question.clone()}</h1>
                                {p.description.clone().map(|d| view! { <p class="text-gray-400 mt-2">{d}</p> })}
                                <p class="text-xs text-gray-500 mt-2">
                                    {format!("by {} · {}", p.creator_name, p.created_at.format("%b %e, %Y"))}
                                </p>
                            </div>

                            <div class="space-y-3">
                                {p.options.iter().enumerate().map(|(i, label)| {
                                    let count = p.votes.get(i).copied().unwrap_or(0);
                                    let pct = percent(count, p.total_votes);
                                    let chosen = p.voted_option == Some(i);
                                    let disabled = p.has_voted;
                                    let cast_vote = cast_vote.clone();
                                    view! {
                                        <button
                                            disabled=move || disabled || voting.get()
                                            on:click=move |_| cast_vote(i)
                                            class=if chosen {
                                                "w-full text-left rounded-lg p-3 border-2 border-primary-500 bg-gray-700"
                                            } else {
                                                "w-full text-left rounded-lg p-3 border-2 border-transparent bg-gray-700 hover:bg-gray-600 disabled:hover:bg-gray-700"
                                            }
                                        >
                                            <div class="flex justify-between text-sm mb-1">
                                                <span>{label.clone()} {chosen.then(|| " ✓")}</span>
                                                <span>{format!("{} votes ({}%)", count, pct)}</span>
                                            </div>
                                            <div class="h-2 bg-gray-600 rounded">
                                                <div class="h-2 bg-primary-500 rounded" style=format!("width: {}%", pct) />
                                            </div>
                                        </button>
                                    }
                                }).collect_view()}
                            </div>

                            <div class="flex items-center justify-between text-sm text-gray-400">
                                <span>{format!("{} total votes", p.total_votes)}</span>
                                {p.has_voted.then(|| view! { <span>"You've already voted!"</span> })}
                            </div>

                            <button
                                on:click=share.clone()
                                class="w-full bg-gray-700 hover:bg-gray-600 rounded-lg py-3 font-medium transition-colors"
                            >
                                "Share this poll"
                            </button>
                        </div>
                    }.into_view()
                }
            }}
        </div>
    }
}
