//! DrawCal Web App
//!
//! Handwriting calculator front end built with Leptos (WASM).
//!
//! # Features
//!
//! - Google and password sign-in with persisted sessions
//! - Drawing canvas whose snapshots are recognised and evaluated by the backend
//! - Variables carried between calculations
//! - Profile popup with calculation history
//!
//! # Architecture
//!
//! This is a client-side rendered (CSR) Leptos application that compiles to
//! WebAssembly. Session handling, result formatting and response
//! interpretation come from the `drawcal` crate; this crate adds the browser
//! adapters and the views.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
