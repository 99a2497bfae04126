//! Classification of transport failures that happen before an HTTP status exists.

use super::ApiError;
use regex::Regex;
use std::error::Error as _;

fn is_cors_failure(message: &str) -> bool {
    Regex::new(r"(?i)\bcors\b|cross-origin|access-control-allow-origin")
        .map_or(false, |re| re.is_match(message))
}

fn is_unreachable(message: &str) -> bool {
    Regex::new(r"(?i)failed to fetch|network ?request failed|connection refused|dns error")
        .map_or(false, |re| re.is_match(message))
}

fn unreachable(origin: &str) -> ApiError {
    ApiError::Network(format!(
        "unable to reach the server at {origin}. Check your connection and that the backend is running."
    ))
}

/// Maps a transport error message to a `Network` error. CORS and reachability
/// signatures get dedicated messages naming the target origin.
#[must_use]
pub fn classify_transport_message(message: &str, origin: &str) -> ApiError {
    if is_cors_failure(message) {
        ApiError::Network(format!(
            "request to {origin} was blocked by the cross-origin (CORS) policy"
        ))
    } else if is_unreachable(message) {
        unreachable(origin)
    } else {
        ApiError::Network(message.to_string())
    }
}

/// Flattens an error and its sources into one message.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

pub(crate) fn classify_transport_error(err: &reqwest::Error, origin: &str) -> ApiError {
    if err.is_timeout() {
        return ApiError::Network(format!("request to {origin} timed out"));
    }

    let message = error_chain(err);
    if err.is_connect() && !is_cors_failure(&message) {
        return unreachable(origin);
    }

    classify_transport_message(&message, origin)
}
