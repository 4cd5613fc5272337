//! Modal overlay and scroll lock
//!
//! [`OverlayGuard`] blurs the page and stops background scrolling for as
//! long as it lives. Dropping it puts the document back the way it was.

/// Element id of the blur overlay
pub const OVERLAY_ID: &str = "profile-blur-overlay";

/// Document operations the guard needs
pub trait OverlayHost {
    /// Current inline `overflow` of the scrolling element
    fn scroll_style(&self) -> Option<String>;

    /// Set (`Some`) or clear (`None`) the inline `overflow`
    fn set_scroll_style(&self, value: Option<&str>);

    fn insert_overlay(&self, id: &str);

    /// Remove the overlay; a missing element is not an error
    fn remove_overlay(&self, id: &str);
}

impl<H: OverlayHost + ?Sized> OverlayHost for &H {
    fn scroll_style(&self) -> Option<String> {
        (**self).scroll_style()
    }

    fn set_scroll_style(&self, value: Option<&str>) {
        (**self).set_scroll_style(value)
    }

    fn insert_overlay(&self, id: &str) {
        (**self).insert_overlay(id)
    }

    fn remove_overlay(&self, id: &str) {
        (**self).remove_overlay(id)
    }
}

/// Overlay and scroll lock held for the guard's lifetime
#[must_use = "the overlay is removed as soon as the guard is dropped"]
pub struct OverlayGuard<H: OverlayHost> {
    host: H,
    previous_overflow: Option<String>,
}

impl<H: OverlayHost> OverlayGuard<H> {
    pub fn acquire(host: H) -> Self {
        let previous_overflow = host.scroll_style();
        host.set_scroll_style(Some("hidden"));
        host.insert_overlay(OVERLAY_ID);
        tracing::debug!("Overlay acquired");

        Self {
            host,
            previous_overflow,
        }
    }

    /// Explicit release; same as dropping the guard
    pub fn release(self) {}
}

impl<H: OverlayHost> Drop for OverlayGuard<H> {
    fn drop(&mut self) {
        self.host.remove_overlay(OVERLAY_ID);
        self.host
            .set_scroll_style(self.previous_overflow.as_deref());
        tracing::debug!("Overlay released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeDocument {
        overflow: RefCell<Option<String>>,
        overlays: RefCell<Vec<String>>,
    }

    impl OverlayHost for FakeDocument {
        fn scroll_style(&self) -> Option<String> {
            self.overflow.borrow().clone()
        }

        fn set_scroll_style(&self, value: Option<&str>) {
            *self.overflow.borrow_mut() = value.map(str::to_string);
        }

        fn insert_overlay(&self, id: &str) {
            self.overlays.borrow_mut().push(id.to_string());
        }

        fn remove_overlay(&self, id: &str) {
            self.overlays.borrow_mut().retain(|o| o != id);
        }
    }

    #[test]
    fn test_open_then_close_restores_document() {
        let doc = FakeDocument::default();

        let guard = OverlayGuard::acquire(&doc);
        assert_eq!(doc.scroll_style().as_deref(), Some("hidden"));
        assert_eq!(*doc.overlays.borrow(), vec![OVERLAY_ID.to_string()]);

        guard.release();
        assert_eq!(doc.scroll_style(), None);
        assert!(doc.overlays.borrow().is_empty());
    }

    #[test]
    fn test_previous_overflow_restored() {
        let doc = FakeDocument::default();
        doc.set_scroll_style(Some("scroll"));

        {
            let _guard = OverlayGuard::acquire(&doc);
            assert_eq!(doc.scroll_style().as_deref(), Some("hidden"));
        }

        assert_eq!(doc.scroll_style().as_deref(), Some("scroll"));
        assert!(doc.overlays.borrow().is_empty());
    }

    #[test]
    fn test_released_on_unwind() {
        let doc = FakeDocument::default();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = OverlayGuard::acquire(&doc);
            panic!("component torn down");
        }));

        assert!(outcome.is_err());
        assert_eq!(doc.scroll_style(), None);
        assert!(doc.overlays.borrow().is_empty());
    }
}
