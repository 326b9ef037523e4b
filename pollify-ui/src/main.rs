//! Pollify web app
//!
//! Create polls, share them by link, and watch votes arrive live. Built with
//! Leptos (WASM).
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. It talks to the Pollify API over HTTP and WebSocket; the
//! session token lives in `localStorage`.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod share;
mod state;
mod validation;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
