//! In-process identity provider. It backs the CLI's static-token mode (a bearer
//! token obtained elsewhere) and serves as the substitutable fake for tests.
//! Accounts registered here live only as long as the provider.

use super::{IdentityError, IdentityProvider, Session, SessionHub, SessionSubscription, TokenProvider};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, MutexGuard, PoisonError,
};
use tracing::debug;

struct Account {
    password: SecretString,
    session: Session,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    token: Option<SecretString>,
}

pub struct InMemoryIdentity {
    hub: SessionHub,
    state: Mutex<State>,
    token_requests: AtomicUsize,
}

impl Default for InMemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentity {
    /// Signed-out provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hub: SessionHub::determined(None),
            state: Mutex::new(State::default()),
            token_requests: AtomicUsize::new(0),
        }
    }

    /// Provider that starts signed in with an externally issued bearer token.
    #[must_use]
    pub fn with_session(session: Session, token: SecretString) -> Self {
        let provider = Self {
            hub: SessionHub::determined(Some(session)),
            state: Mutex::new(State::default()),
            token_requests: AtomicUsize::new(0),
        };
        provider.lock().token = Some(token);
        provider
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the active session and token, emitting the new session.
    pub fn set_session(&self, session: Session, token: SecretString) {
        self.lock().token = Some(token);
        self.hub.publish(Some(session));
    }

    /// Drops the active session, emitting `None`.
    pub fn clear_session(&self) {
        self.lock().token = None;
        self.hub.publish(None);
    }

    /// Adds an account that `sign_in` will accept.
    pub fn add_account(&self, email: &str, password: SecretString, session: Session) {
        self.lock().accounts.insert(
            email.to_lowercase(),
            Account { password, session },
        );
    }

    /// Number of times a token was requested.
    #[must_use]
    pub fn token_requests(&self) -> usize {
        self.token_requests.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn hub(&self) -> &SessionHub {
        &self.hub
    }
}

fn issue_token(session: &Session) -> SecretString {
    SecretString::from(format!("memory.{}", session.identity_id))
}

#[async_trait]
impl TokenProvider for InMemoryIdentity {
    async fn get_token(&self) -> Result<Option<SecretString>, IdentityError> {
        self.token_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().token.clone())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    fn subscribe(&self) -> SessionSubscription {
        self.hub.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, IdentityError> {
        let session = {
            let state = self.lock();
            let account = state
                .accounts
                .get(&email.to_lowercase())
                .ok_or_else(|| IdentityError::from_code("EMAIL_NOT_FOUND"))?;
            if account.password.expose_secret() != password.expose_secret() {
                return Err(IdentityError::from_code("INVALID_PASSWORD"));
            }
            account.session.clone()
        };

        debug!(identity_id = %session.identity_id, "signed in");
        self.set_session(session.clone(), issue_token(&session));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.clear_session();
        Ok(())
    }

    async fn register_user(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, IdentityError> {
        if password.expose_secret().len() < 6 {
            return Err(IdentityError::from_code("WEAK_PASSWORD"));
        }

        let session = {
            let mut state = self.lock();
            let key = email.to_lowercase();
            if state.accounts.contains_key(&key) {
                return Err(IdentityError::from_code("EMAIL_EXISTS"));
            }
            let session =
                Session::new(format!("mem-{}", state.accounts.len() + 1)).with_email(email);
            state.accounts.insert(
                key,
                Account {
                    password: password.clone(),
                    session: session.clone(),
                },
            );
            session
        };

        self.set_session(session.clone(), issue_token(&session));
        Ok(session)
    }
}
