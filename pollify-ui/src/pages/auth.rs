//! Login and sign-up pages
//!
//! Both share one form; only the call and the wording differ.

use leptos::*;
use leptos_router::*;

use crate::api;
use crate::state::GlobalState;
use crate::validation::validate_credentials;

#[derive(Clone, Copy, PartialEq)]
enum AuthMode {
    Login,
    Signup,
}

#[component]
pub fn Login() -> impl IntoView {
    view! { <AuthForm mode=AuthMode::Login /> }
}

#[component]
pub fn Signup() -> impl IntoView {
    view! { <AuthForm mode=AuthMode::Signup /> }
}

#[component]
fn AuthForm(mode: AuthMode) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let navigate = use_navigate();

    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (submitting, set_submitting) = create_signal(false);

    let (title, button, switch_text, switch_href, switch_label) = match mode {
        AuthMode::Login => ("Login", "Login", "Don't have an account?", "/signup", "Sign Up"),
        AuthMode::Signup => ("Sign Up", "Create Account", "Already have an account?", "/login", "Login"),
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let e = email.get();
        let p = password.get();
        if mode == AuthMode::Signup {
            if let Err(msg) = validate_credentials(&e, &p) {
                state.show_error(&msg);
                return;
            }
        }

        set_submitting.set(true);
        let state = state.clone();
        let navigate = navigate.clone();
        spawn_local(async move {
            let result = match mode {
                AuthMode::Login => api::login(e.trim(), &p).await,
                AuthMode::Signup => api::signup(e.trim(), &p).await,
            };
            match result {
                Ok(user) => {
                    let message = match mode {
                        AuthMode::Login => "Logged in successfully!",
                        AuthMode::Signup => "Account created successfully!",
                    };
                    state.user.set(Some(user));
                    state.show_success(message);
                    navigate("/", Default::default());
                }
                Err(err) => state.show_error(&err),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <div class="max-w-md mx-auto bg-gray-800 rounded-xl p-8">
            <h1 class="text-2xl font-bold mb-6">{title}</h1>
            <form on:submit=on_submit class="space-y-4">
                <input
                    type="email"
                    placeholder="Email"
                    required=true
                    prop:value=move || email.get()
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    class="w-full bg-gray-700 rounded-lg px-4 py-3 border border-gray-600 focus:border-primary-500 focus:outline-none"
                />
                <input
                    type="password"
                    placeholder="Password"
                    required=true
                    prop:value=move || password.get()
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                    class="w-full bg-gray-700 rounded-lg px-4 py-3 border border-gray-600 focus:border-primary-500 focus:outline-none"
                />
                <button
                    type="submit"
                    disabled=move || submitting.get()
                    class="w-full bg-primary-600 hover:bg-primary-700 disabled:bg-gray-600 rounded-lg py-3 font-semibold transition-colors"
                >
                    {move || if submitting.get() { "Please wait..." } else { button }}
                </button>
            </form>
            <p class="text-sm text-gray-400 mt-4">
                {switch_text} " "
                <A href=switch_href class="text-primary-400 hover:underline">{switch_label}</A>
            </p>
        </div>
    }
}

/// Send signed-out visitors to the login page once the session check is done
pub fn require_login() {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let navigate = use_navigate();

    create_effect(move |_| {
        if state.auth_ready.get() && state.user.get().is_none() {
            state.show_error("Please log in first");
            navigate("/login", Default::default());
        }
    });
}
