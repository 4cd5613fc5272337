//! Home Page
//!
//! Drawing canvas, calculation results and the profile popup.

use leptos::*;

use drawcal::api::CalculatorApi;
use drawcal::calculator::{Calculator, CanvasImage};

use crate::components::{Canvas, ProfilePopup, Results};
use crate::state::use_session;

#[component]
pub fn Home() -> impl IntoView {
    let session = use_session();
    let calculator = create_rw_signal(Calculator::new());
    let profile_open = create_rw_signal(false);

    let on_calculate = Callback::new(move |image: CanvasImage| {
        let Some(credentials) = session.credentials() else {
            return;
        };
        // `None` while a request is already in flight
        let Some(request) = calculator.try_update(|c| c.begin(&image)).flatten() else {
            return;
        };

        let backend = session.backend.clone();
        spawn_local(async move {
            let outcome = backend.process(&credentials, &request).await;
            if let Err(e) = &outcome {
                web_sys::console::error_1(&format!("Error: {}", e).into());
            }
            calculator.update(|c| {
                c.apply(outcome);
            });
        });
    });

    let on_reset = Callback::new(move |_: ()| calculator.update(|c| c.clear_results()));

    let loading = Signal::derive(move || calculator.with(|c| c.is_loading()));
    let results = Signal::derive(move || calculator.with(|c| c.results().to_vec()));

    view! {
        <div class="fixed top-4 right-4 z-30">
            <button
                on:click=move |_| profile_open.set(true)
                title="Profile"
                class="w-10 h-10 rounded-md bg-blue-600 text-white shadow-md hover:shadow-lg transition-all"
            >
                "👤"
            </button>
        </div>

        <Canvas on_calculate=on_calculate on_reset=on_reset loading=loading />

        <Results results=results />

        <ProfilePopup open=profile_open />
    }
}
