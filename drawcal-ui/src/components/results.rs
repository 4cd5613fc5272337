//! Calculation results panel

use leptos::*;

use drawcal::calculator::CalculationResult;

/// Results of the last calculation; hidden while empty
#[component]
pub fn Results(#[prop(into)] results: Signal<Vec<CalculationResult>>) -> impl IntoView {
    move || {
        let items = results.get();
        if items.is_empty() {
            return view! {}.into_view();
        }

        view! {
            <div class="fixed bottom-4 left-4 bg-white p-4 rounded-lg shadow-lg z-20">
                {items
                    .into_iter()
                    .map(|item| view! {
                        <div class="text-lg font-semibold">
                            <p>"Expression: " {item.expression}</p>
                            <p>"Result: " {item.result}</p>
                        </div>
                    })
                    .collect_view()}
            </div>
        }
        .into_view()
    }
}
