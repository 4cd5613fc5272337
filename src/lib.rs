//! # DrawCal
//!
//! Client core for the DrawCal handwriting calculator: users draw an
//! expression, the backend recognises and evaluates it, and this crate
//! handles everything around that round trip.
//!
//! ## Modules
//!
//! - [`format`]: display formatting for numeric results
//! - [`session`]: persisted session state machine
//! - [`login`]: OAuth token and password sign-in
//! - [`calculator`]: canvas submission, result interpretation, variable bindings
//! - [`profile`]: profile popup state and history timestamps
//! - [`overlay`]: scoped modal overlay and scroll lock
//! - [`api`]: wire types and backend traits
//! - [`storage`]: key-value persistence
//! - [`config`]: TOML/env configuration (feature `native`)
//!
//! The library is platform neutral. With the default `native` feature it also
//! ships a `reqwest` backend, a file-backed store and the `drawcal` CLI; the
//! browser app builds against it with default features off.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use drawcal::api::HttpBackend;
//! use drawcal::calculator::{CanvasImage, Calculator};
//! use drawcal::config::Config;
//! use drawcal::session::SessionStore;
//! use drawcal::storage::FileStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let backend = HttpBackend::new(&config.api)?;
//!     let mut session = SessionStore::new(FileStore::new(config.storage.session_path()));
//!
//!     session.restore(&backend).await;
//!     let credentials = session.credentials().ok_or("not logged in")?;
//!
//!     let image = CanvasImage::from_png(&std::fs::read("drawing.png")?)?;
//!     let mut calculator = Calculator::new();
//!     for result in calculator.submit(&backend, &credentials, &image).await {
//!         println!("{} = {}", result.expression, result.result);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod calculator;
#[cfg(feature = "native")]
pub mod config;
pub mod format;
pub mod login;
pub mod overlay;
pub mod profile;
pub mod session;
pub mod storage;

#[cfg(test)]
mod testing;

// Re-export top-level types for convenience
pub use api::{ApiError, AuthApi, CalculatorApi, Credentials, ProfileApi, UserIdentity};
pub use calculator::{CalculationResult, Calculator, CanvasImage, VariableBindings};
pub use format::format_number;
pub use login::LoginError;
pub use overlay::{OverlayGuard, OverlayHost};
pub use profile::{ProfilePanel, ProfileTab};
pub use session::{Session, SessionState, SessionStore};
pub use storage::{KeyValueStore, MemoryStore, StoreError};
