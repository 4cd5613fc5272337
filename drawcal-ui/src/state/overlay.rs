//! Overlay host backed by `document.body`

use drawcal::overlay::OverlayHost;
use web_sys::{Document, HtmlElement};

const OVERLAY_STYLE: &str = "position: fixed; top: 0; left: 0; width: 100%; height: 100%; \
                             backdrop-filter: blur(5px); z-index: 999;";

#[derive(Debug, Clone, Copy, Default)]
pub struct BodyOverlay;

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn body() -> Option<HtmlElement> {
    document()?.body()
}

impl OverlayHost for BodyOverlay {
    fn scroll_style(&self) -> Option<String> {
        body()?
            .style()
            .get_property_value("overflow")
            .ok()
            .filter(|value| !value.is_empty())
    }

    fn set_scroll_style(&self, value: Option<&str>) {
        let Some(body) = body() else { return };
        let style = body.style();

        let outcome = match value {
            Some(value) => style.set_property("overflow", value),
            None => style.remove_property("overflow").map(|_| ()),
        };
        if let Err(e) = outcome {
            web_sys::console::error_1(&e);
        }
    }

    fn insert_overlay(&self, id: &str) {
        let (Some(document), Some(body)) = (document(), body()) else {
            return;
        };

        let outcome = document.create_element("div").and_then(|overlay| {
            overlay.set_id(id);
            overlay.set_attribute("style", OVERLAY_STYLE)?;
            body.append_child(&overlay).map(|_| ())
        });
        if let Err(e) = outcome {
            web_sys::console::error_1(&e);
        }
    }

    fn remove_overlay(&self, id: &str) {
        if let Some(overlay) = document().and_then(|d| d.get_element_by_id(id)) {
            overlay.remove();
        }
    }
}
