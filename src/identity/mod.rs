//! Identity provider boundary. The provider owns sign-in state and bearer token
//! lifecycles; this module only normalizes its user objects into [`Session`] and
//! exposes the session stream and token lookup the rest of the crate consumes.
//!
//! Providers are injected as `Arc<dyn IdentityProvider>` (or any concrete type
//! implementing the traits) so tests can substitute [`memory::InMemoryIdentity`].
//! Token material is wrapped in [`SecretString`] and must never be logged.

pub mod errors;
pub mod listener;
pub mod memory;
pub mod rest;

pub use errors::IdentityError;
pub use listener::{SessionHub, SessionSubscription};

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Minimal signed-in identity as confirmed by the provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(identity_id: impl Into<String>) -> Self {
        Self {
            identity_id: identity_id.into(),
            email: None,
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Splits the display name into first and last name on the first whitespace.
    /// Either part is `None` when the provider did not supply enough data.
    #[must_use]
    pub fn name_parts(&self) -> (Option<String>, Option<String>) {
        let Some(display_name) = self.display_name.as_deref().map(str::trim) else {
            return (None, None);
        };

        let mut parts = display_name.splitn(2, char::is_whitespace);
        let first = parts
            .next()
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let last = parts
            .next()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        (first, last)
    }
}

/// Source of bearer tokens for outgoing API calls.
///
/// Callers must ask for a token on every request and never memoize the result;
/// the provider decides when a token is refreshed.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the current session's bearer token, or `None` when signed out.
    ///
    /// # Errors
    /// Returns an error if the provider could not mint or refresh a token.
    async fn get_token(&self) -> Result<Option<SecretString>, IdentityError>;
}

/// Full identity provider contract consumed by the portal.
#[async_trait]
pub trait IdentityProvider: TokenProvider {
    /// Subscribes to session changes. The subscription yields the current state
    /// first (once the provider has determined it) and then every change.
    fn subscribe(&self) -> SessionSubscription;

    /// Signs in with email and password.
    ///
    /// # Errors
    /// Returns an error with a user-facing message if the credentials are rejected
    /// or the provider is unreachable.
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, IdentityError>;

    /// Signs out the current session.
    ///
    /// # Errors
    /// Returns an error if the provider fails to clear the session.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Registers a new account and signs it in.
    ///
    /// # Errors
    /// Returns an error with a user-facing message if registration is rejected.
    async fn register_user(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn name_parts_splits_on_first_whitespace() {
        let session = Session::new("uid-1").with_display_name("Ada  King Lovelace");
        assert_eq!(
            session.name_parts(),
            (Some("Ada".to_string()), Some("King Lovelace".to_string()))
        );
    }

    #[test]
    fn name_parts_handles_missing_and_single_names() {
        assert_eq!(Session::new("uid-1").name_parts(), (None, None));
        assert_eq!(
            Session::new("uid-1").with_display_name("Ada").name_parts(),
            (Some("Ada".to_string()), None)
        );
        assert_eq!(
            Session::new("uid-1").with_display_name("   ").name_parts(),
            (None, None)
        );
    }
}
