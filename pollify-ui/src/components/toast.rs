//! Toasts for action outcomes (vote cast, poll deleted, login failed, ...)

use leptos::*;

use crate::state::GlobalState;

#[component]
pub fn Toast() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let success = state.success;
    let error = state.error;

    view! {
        <div class="fixed top-20 inset-x-0 z-50 flex flex-col items-center gap-2 pointer-events-none">
            {move || success.get().map(|text| view! {
                <Notice text=text tone=Tone::Ok on_dismiss=move |_| success.set(None) />
            })}
            {move || error.get().map(|text| view! {
                <Notice text=text tone=Tone::Failed on_dismiss=move |_| error.set(None) />
            })}
        </div>
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Tone {
    Ok,
    Failed,
}

#[component]
fn Notice(
    #[prop(into)] text: String,
    tone: Tone,
    #[prop(into)] on_dismiss: Callback<()>,
) -> impl IntoView {
    let colors = if tone == Tone::Ok {
        "bg-emerald-600 border-emerald-400"
    } else {
        "bg-rose-600 border-rose-400"
    };
    let role = if tone == Tone::Ok { "status" } else { "alert" };

    view! {
        <div
            role=role
            class=format!(
                "pointer-events-auto flex items-start gap-3 max-w-md w-[90%] border-l-4 {} \
                 text-white px-4 py-3 rounded shadow-lg animate-slide-in",
                colors
            )
        >
            <p class="flex-1 text-sm">{text}</p>
            <button
                class="text-white/80 hover:text-white text-sm"
                aria-label="Dismiss"
                on:click=move |_| on_dismiss.call(())
            >
                "Dismiss"
            </button>
        </div>
    }
}
