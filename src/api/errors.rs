use super::ApiResponse;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ApiError {
    /// Transport failure before any HTTP status was received.
    #[error("Network error: {0}")]
    Network(String),
    /// The body was not valid JSON or did not match the expected shape.
    #[error("Response error: {0}")]
    Parse(String),
    /// Non-2xx HTTP status. `message` is chosen from the envelope.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        response: Box<ApiResponse>,
    },
    /// 2xx response whose envelope reported `success: false`.
    #[error("{0}")]
    Rejected(String),
    /// The identity provider could not supply a bearer token.
    #[error("Authentication error: {0}")]
    Token(String),
    /// The request could not be built.
    #[error("Request error: {0}")]
    Request(String),
}

impl ApiError {
    /// Builds the HTTP error for a non-success status, preferring `error`, then
    /// `message`, then a generic description.
    #[must_use]
    pub fn from_status(status: u16, response: ApiResponse) -> Self {
        let message = response
            .error_message()
            .map_or_else(|| format!("request failed with status {status}"), str::to_string);

        Self::Http {
            status,
            message,
            response: Box::new(response),
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Normalized envelope of a failed HTTP response, for caller inspection.
    #[must_use]
    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Http { response, .. } => Some(response),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
