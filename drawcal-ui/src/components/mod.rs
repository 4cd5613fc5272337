//! UI Components
//!
//! Reusable Leptos components for the calculator screens.

pub mod canvas;
pub mod loading;
pub mod profile_popup;
pub mod results;

pub use canvas::Canvas;
pub use loading::{InlineLoading, Loading};
pub use profile_popup::ProfilePopup;
pub use results::Results;
