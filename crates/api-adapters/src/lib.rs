//! # api-adapters
//!
//! The HTTP surface of the event board (feature `web-axum`). Handlers parse
//! requests, build the explicit `Actor` context and call into `services`;
//! they hold no business rules of their own.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod cookies;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extract;
#[cfg(feature = "web-axum")]
pub mod guard;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod multipart;
#[cfg(feature = "web-axum")]
pub mod router;
#[cfg(feature = "web-axum")]
pub mod state;
#[cfg(feature = "web-axum")]
pub mod views;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "web-axum")]
pub use extract::{CurrentActor, MaybeActor};
#[cfg(feature = "web-axum")]
pub use router::router;
#[cfg(feature = "web-axum")]
pub use state::{AppState, Policies, Ports, WebSettings};
