//! Identity provider failures and the user-facing messages for provider error
//! codes. Raw provider codes are normalized first (REST APIs report
//! `EMAIL_EXISTS`, SDKs report `auth/email-already-in-use`) so both map to the
//! same message.

use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The provider rejected the operation. `message` is safe to show to users.
    #[error("{message}")]
    Auth { code: String, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Response error: {0}")]
    Response(String),
}

impl IdentityError {
    /// Builds an auth error from a raw provider code.
    #[must_use]
    pub fn from_code(raw: &str) -> Self {
        let code = normalize_code(raw);
        Self::Auth {
            message: auth_error_message(code).to_string(),
            code: code.to_string(),
        }
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Auth { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Maps REST-style codes (optionally followed by ` : detail`) to canonical codes.
#[must_use]
pub fn normalize_code(raw: &str) -> &str {
    let code = raw.split(" : ").next().unwrap_or(raw).trim();

    match code {
        "EMAIL_EXISTS" => "auth/email-already-in-use",
        "INVALID_EMAIL" | "MISSING_EMAIL" => "auth/invalid-email",
        "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => "auth/operation-not-allowed",
        "WEAK_PASSWORD" => "auth/weak-password",
        "USER_DISABLED" => "auth/user-disabled",
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => "auth/user-not-found",
        "INVALID_PASSWORD" => "auth/wrong-password",
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_IDP_RESPONSE" => "auth/invalid-credential",
        "TOO_MANY_ATTEMPTS_TRY_LATER" => "auth/too-many-requests",
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "INVALID_ID_TOKEN" => "auth/user-token-expired",
        other => other,
    }
}

/// Human-readable message for a canonical provider code.
#[must_use]
pub fn auth_error_message(code: &str) -> &'static str {
    match code {
        "auth/email-already-in-use" => "This email is already registered. Please sign in instead.",
        "auth/invalid-email" => "Invalid email address format.",
        "auth/operation-not-allowed" => {
            "Email/password authentication is not enabled. Please contact support."
        }
        "auth/weak-password" => "Password is too weak. Please use at least 6 characters.",
        "auth/user-disabled" => "This account has been disabled. Please contact support.",
        "auth/user-not-found" => "No account found with this email.",
        "auth/wrong-password" => "Incorrect password. Please try again.",
        "auth/invalid-credential" => "Invalid email or password. Please check your credentials.",
        "auth/too-many-requests" => "Too many failed attempts. Please try again later.",
        "auth/network-request-failed" => "Network error. Please check your internet connection.",
        "auth/user-token-expired" => "Your session has expired. Please sign in again.",
        _ => "An error occurred. Please try again.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_codes_map_to_sdk_messages() {
        let err = IdentityError::from_code("EMAIL_EXISTS");
        assert_eq!(err.code(), Some("auth/email-already-in-use"));
        assert_eq!(
            err.to_string(),
            "This email is already registered. Please sign in instead."
        );
    }

    #[test]
    fn detail_suffix_is_ignored() {
        assert_eq!(
            normalize_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            "auth/weak-password"
        );
        assert_eq!(
            normalize_code("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            "auth/too-many-requests"
        );
    }

    #[test]
    fn sdk_codes_pass_through() {
        assert_eq!(normalize_code("auth/wrong-password"), "auth/wrong-password");
        assert_eq!(
            IdentityError::from_code("auth/wrong-password").to_string(),
            "Incorrect password. Please try again."
        );
    }

    #[test]
    fn unknown_codes_get_generic_message() {
        let err = IdentityError::from_code("SOMETHING_NEW");
        assert_eq!(err.code(), Some("SOMETHING_NEW"));
        assert_eq!(err.to_string(), "An error occurred. Please try again.");
    }

    #[test]
    fn network_errors_are_prefixed() {
        let err = IdentityError::Network("connection refused".to_string());
        assert!(err.to_string().starts_with("Network error:"));
        assert_eq!(err.code(), None);
    }
}
