//! Drawing Canvas
//!
//! Freehand drawing surface. "Calculate" hands the snapshot to the parent as
//! a PNG data URL.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

use drawcal::calculator::CanvasImage;

use super::InlineLoading;

const BACKGROUND: &str = "#000000";

/// Stroke colors offered in the toolbar
const SWATCHES: [&str; 6] = [
    "#ffffff", // White (default)
    "#ee3333", // Red
    "#e64980", // Pink
    "#be4bdb", // Purple
    "#228be6", // Blue
    "#fab005", // Yellow
];

const LINE_WIDTH: f64 = 3.0;

#[component]
pub fn Canvas(
    on_calculate: Callback<CanvasImage>,
    on_reset: Callback<()>,
    #[prop(into)]
    loading: Signal<bool>,
) -> impl IntoView {
    let canvas_ref = create_node_ref::<html::Canvas>();
    let drawing = store_value(false);
    let (color, set_color) = create_signal(SWATCHES[0]);

    // Fill the viewport and paint the background once mounted
    create_effect(move |_| {
        if let Some(canvas) = canvas_ref.get() {
            if let Some(window) = web_sys::window() {
                let width = window.inner_width().ok().and_then(|w| w.as_f64()).unwrap_or(800.0);
                let height = window.inner_height().ok().and_then(|h| h.as_f64()).unwrap_or(600.0);
                canvas.set_width(width as u32);
                canvas.set_height(height as u32);
            }
            clear(&canvas);
        }
    });

    let on_mousedown = move |ev: MouseEvent| {
        let Some(ctx) = canvas_ref.get().and_then(|canvas| context(&canvas)) else {
            return;
        };
        ctx.begin_path();
        ctx.move_to(ev.offset_x() as f64, ev.offset_y() as f64);
        drawing.set_value(true);
    };

    let on_mousemove = move |ev: MouseEvent| {
        if !drawing.get_value() {
            return;
        }
        let Some(ctx) = canvas_ref.get().and_then(|canvas| context(&canvas)) else {
            return;
        };
        ctx.set_stroke_style(&color.get_untracked().into());
        ctx.set_line_width(LINE_WIDTH);
        ctx.set_line_cap("round");
        ctx.line_to(ev.offset_x() as f64, ev.offset_y() as f64);
        ctx.stroke();
    };

    let stop_drawing = move |_: MouseEvent| drawing.set_value(false);

    let calculate = move |_| {
        let Some(canvas) = canvas_ref.get() else { return };

        match canvas.to_data_url() {
            Ok(data_url) => match CanvasImage::from_data_url(data_url) {
                Ok(image) => on_calculate.call(image),
                Err(e) => {
                    web_sys::console::error_1(&format!("Canvas snapshot unusable: {}", e).into())
                }
            },
            Err(e) => web_sys::console::error_1(&e),
        }
    };

    let reset = move |_| {
        if let Some(canvas) = canvas_ref.get() {
            clear(&canvas);
        }
        on_reset.call(());
    };

    view! {
        <div class="relative">
            <div class="fixed top-4 left-4 z-20 flex items-center space-x-3">
                <button
                    on:click=reset
                    class="px-4 py-2 rounded-lg bg-gray-700 hover:bg-gray-600 text-white font-medium"
                >
                    "Reset"
                </button>

                <div class="flex space-x-2">
                    {SWATCHES
                        .into_iter()
                        .map(|swatch| view! {
                            <button
                                on:click=move |_| set_color.set(swatch)
                                class=move || {
                                    let base = "w-6 h-6 rounded-full border-2";
                                    if color.get() == swatch {
                                        format!("{} border-white", base)
                                    } else {
                                        format!("{} border-transparent", base)
                                    }
                                }
                                style=format!("background-color: {}", swatch)
                            />
                        })
                        .collect_view()}
                </div>

                <button
                    on:click=calculate
                    disabled=move || loading.get()
                    class="px-4 py-2 rounded-lg bg-blue-600 hover:bg-blue-700 disabled:bg-gray-600
                           disabled:cursor-not-allowed text-white font-medium flex items-center space-x-2"
                >
                    {move || if loading.get() {
                        view! {
                            <InlineLoading />
                            <span>"Calculating..."</span>
                        }.into_view()
                    } else {
                        view! { <span>"Calculate"</span> }.into_view()
                    }}
                </button>
            </div>

            <canvas
                node_ref=canvas_ref
                on:mousedown=on_mousedown
                on:mousemove=on_mousemove
                on:mouseup=stop_drawing
                on:mouseleave=stop_drawing
                class="absolute top-0 left-0 w-full h-full"
            />
        </div>
    }
}

fn context(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .ok()
        .flatten()?
        .dyn_into::<CanvasRenderingContext2d>()
        .ok()
}

/// Paint the whole canvas with the background color
fn clear(canvas: &HtmlCanvasElement) {
    if let Some(ctx) = context(canvas) {
        ctx.set_fill_style(&BACKGROUND.into());
        ctx.fill_rect(0.0, 0.0, canvas.width() as f64, canvas.height() as f64);
    }
}
