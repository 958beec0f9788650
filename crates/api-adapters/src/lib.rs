//! # api-adapters
//!
//! HTTP surface of the materials repository. Routes translate requests into
//! service calls and wrap every JSON answer in the `ApiResponse` envelope.

pub mod metrics;
pub mod response;

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
mod multipart;
#[cfg(feature = "web-axum")]
pub mod routes;
#[cfg(feature = "web-axum")]
pub mod state;

pub use metrics::Metrics;
pub use response::ApiResponse;

#[cfg(feature = "web-axum")]
pub use routes::router;
#[cfg(feature = "web-axum")]
pub use state::AppState;
