//! Authenticated JSON gateway to the portal backend.
//!
//! Every call reads a fresh bearer token from the injected [`TokenProvider`],
//! reads the response body exactly once, and normalizes it into the
//! [`ApiResponse`] envelope regardless of what the backend sent. Failures are
//! classified into [`ApiError`] before callers see them. This layer never retries.
//!
//! [`TokenProvider`]: crate::identity::TokenProvider

mod client;
mod envelope;
mod errors;
mod transport;

pub use client::{ApiGateway, RequestOptions};
pub use envelope::{now_timestamp, ApiResponse};
pub use errors::ApiError;
pub use transport::classify_transport_message;
