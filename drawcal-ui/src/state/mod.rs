//! State Management
//!
//! Session context and the browser adapters behind it.

pub mod overlay;
pub mod session;
pub mod storage;

pub use overlay::BodyOverlay;
pub use session::{provide_session, use_session, SessionContext};
pub use storage::LocalStorage;
