//! Create Poll page

use leptos::*;
use leptos_router::*;

use crate::api::{self, NewPoll};
use crate::pages::require_login;
use crate::state::GlobalState;
use crate::validation::validate_poll;

#[component]
pub fn CreatePoll() -> impl IntoView {
    require_login();

    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let navigate = use_navigate();

    let (question, set_question) = create_signal(String::new());
    let (description, set_description) = create_signal(String::new());
    let options = create_rw_signal(vec![String::new(), String::new()]);
    // Only re-render the inputs when one is added, not on every keystroke
    let option_count = create_memo(move |_| options.with(|o| o.len()));
    let (visibility, set_visibility) = create_signal("private".to_string());
    let (submitting, set_submitting) = create_signal(false);

    let add_option = move |_| options.update(|o| o.push(String::new()));

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let form = match validate_poll(&question.get(), &description.get(), &options.get()) {
            Ok(form) => form,
            Err(msg) => {
                state.show_error(msg);
                return;
            }
        };

        let new_poll = NewPoll {
            question: form.question,
            description: form.description,
            options: form.options,
            visibility: visibility.get(),
        };

        set_submitting.set(true);
        let state = state.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            match api::create_poll(&new_poll).await {
                Ok(poll) => {
                    state.show_success("Poll created successfully!");
                    navigate(&poll.share_path, Default::default());
                }
                Err(e) => state.show_error(&format!("Failed to create poll: {}", e)),
            }
            set_submitting.set(false);
        });
    };

    let input_class = "w-full bg-gray-700 rounded-lg px-4 py-3 border border-gray-600 focus:border-primary-500 focus:outline-none";

    view! {
        <div class="max-w-xl mx-auto bg-gray-800 rounded-xl p-8">
            <h1 class="text-2xl font-bold mb-6">"Create a Poll"</h1>
            <form on:submit=on_submit class="space-y-4">
                <input
                    type="text"
                    placeholder="Your question"
                    prop:value=move || question.get()
                    on:input=move |ev| set_question.set(event_target_value(&ev))
                    class=input_class
                />
                <textarea
                    placeholder="Description (optional)"
                    prop:value=move || description.get()
                    on:input=move |ev| set_description.set(event_target_value(&ev))
                    class=input_class
                />

                <div class="space-y-2">
                    {move || {
                        (0..option_count.get())
                            .map(|i| view! {
                                <input
                                    type="text"
                                    placeholder=format!("Option {}", i + 1)
                                    prop:value=move || options.with(|o| o.get(i).cloned().unwrap_or_default())
                                    on:input=move |ev| {
                                        let value = event_target_value(&ev);
                                        options.update(|o| {
                                            if let Some(slot) = o.get_mut(i) {
                                                *slot = value;
                                            }
                                        });
                                    }
                                    class=input_class
                                />
                            })
                            .collect_view()
                    }}
                </div>

                <button
                    type="button"
                    on:click=add_option
                    class="text-primary-400 hover:text-primary-300 text-sm font-medium"
                >
                    "+ Add another option"
                </button>

                <select
                    on:change=move |ev| set_visibility.set(event_target_value(&ev))
                    class=input_class
                >
                    <option value="private" selected=move || visibility.get() == "private">
                        "Private (only people with the link)"
                    </option>
                    <option value="public" selected=move || visibility.get() == "public">
                        "Public (listed in the feed)"
                    </option>
                </select>

                <button
                    type="submit"
                    disabled=move || submitting.get()
                    class="w-full bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600 rounded-lg py-3 font-semibold transition-colors"
                >
                    {move || if submitting.get() { "Creating..." } else { "Create Poll" }}
                </button>
            </form>
        </div>
    }
}
