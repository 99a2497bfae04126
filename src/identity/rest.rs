//! Email/password identity provider over an Identity Toolkit style REST API.
//!
//! - `POST {identity_url}/v1/accounts:signInWithPassword?key=...`
//! - `POST {identity_url}/v1/accounts:signUp?key=...`
//! - `POST {token_url}/v1/token?key=...` (refresh-token grant)
//!
//! The provider owns the token lifecycle: it keeps the ID token in memory and
//! refreshes it shortly before expiry inside [`TokenProvider::get_token`]. A
//! refresh rejected by the provider invalidates the session and emits `None`.
//! Tokens, refresh tokens and passwords are never logged.

use super::{
    IdentityError, IdentityProvider, Session, SessionHub, SessionSubscription, TokenProvider,
};
use crate::config::{build_url_with_base, IdentityConfig};
use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, info_span, warn, Instrument};
use url::Url;

/// Refresh the ID token when it expires within this window.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);
/// Lifetime assumed when the provider omits `expiresIn`.
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

struct Credentials {
    session: Session,
    id_token: SecretString,
    refresh_token: SecretString,
    expires_at: Instant,
}

impl Credentials {
    fn needs_refresh(&self) -> bool {
        self.expires_at.saturating_duration_since(Instant::now()) <= REFRESH_MARGIN
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

pub struct RestIdentityProvider {
    client: Client,
    config: IdentityConfig,
    hub: SessionHub,
    credentials: Mutex<Option<Credentials>>,
}

impl RestIdentityProvider {
    /// Builds a signed-out provider.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built or the URLs are invalid.
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityError> {
        for url in [&config.identity_url, &config.token_url] {
            Url::parse(url)
                .map_err(|err| IdentityError::Config(format!("invalid URL {url}: {err}")))?;
        }
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(IdentityError::Config(
                "identity provider API key is not configured.".to_string(),
            ));
        }

        let mut builder = Client::builder().user_agent(crate::APP_USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| IdentityError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            config,
            hub: SessionHub::determined(None),
            credentials: Mutex::new(None),
        })
    }

    fn endpoint(&self, base: &str, path: &str) -> Result<Url, IdentityError> {
        let url = build_url_with_base(base, path);
        Url::parse_with_params(&url, &[("key", self.config.api_key.expose_secret())])
            .map_err(|err| IdentityError::Config(format!("invalid identity endpoint: {err}")))
    }

    async fn account_request(
        &self,
        path: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, IdentityError> {
        let url = self.endpoint(&self.config.identity_url, path)?;
        let payload = json!({
            "email": email,
            "password": password.expose_secret(),
            "returnSecureToken": true,
        });

        let span = info_span!("identity.account", http.method = "POST", path = %path);
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        let account: AccountResponse = handle_response(response).await?;
        let session = Session {
            identity_id: account.local_id,
            email: account.email.or_else(|| Some(email.to_string())),
            display_name: account.display_name.filter(|name| !name.is_empty()),
        };

        let credentials = Credentials {
            session: session.clone(),
            id_token: SecretString::from(account.id_token),
            refresh_token: SecretString::from(account.refresh_token),
            expires_at: expires_at(account.expires_in.as_deref()),
        };
        *self.credentials.lock().await = Some(credentials);
        self.hub.publish(Some(session.clone()));

        debug!(identity_id = %session.identity_id, "identity session established");
        Ok(session)
    }

    async fn refresh(&self, credentials: &mut Credentials) -> Result<(), IdentityError> {
        let url = self.endpoint(&self.config.token_url, "/v1/token")?;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", credentials.refresh_token.expose_secret()),
        ];

        let span = info_span!("identity.refresh", http.method = "POST");
        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;

        let refreshed: RefreshResponse = handle_response(response).await?;
        credentials.id_token = SecretString::from(refreshed.id_token);
        credentials.refresh_token = SecretString::from(refreshed.refresh_token);
        credentials.expires_at = expires_at(refreshed.expires_in.as_deref());
        debug!(identity_id = %credentials.session.identity_id, "identity token refreshed");
        Ok(())
    }
}

#[async_trait]
impl TokenProvider for RestIdentityProvider {
    async fn get_token(&self) -> Result<Option<SecretString>, IdentityError> {
        let mut guard = self.credentials.lock().await;
        let Some(credentials) = guard.as_mut() else {
            return Ok(None);
        };

        if credentials.needs_refresh() {
            if let Err(err) = self.refresh(credentials).await {
                if matches!(err, IdentityError::Auth { .. }) {
                    warn!("identity provider rejected the refresh token, signing out");
                    *guard = None;
                    drop(guard);
                    self.hub.publish(None);
                }
                return Err(err);
            }
        }

        Ok(Some(credentials.id_token.clone()))
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    fn subscribe(&self) -> SessionSubscription {
        self.hub.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, IdentityError> {
        self.account_request("/v1/accounts:signInWithPassword", email, password)
            .await
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        *self.credentials.lock().await = None;
        self.hub.publish(None);
        Ok(())
    }

    async fn register_user(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, IdentityError> {
        self.account_request("/v1/accounts:signUp", email, password)
            .await
    }
}

fn expires_at(expires_in: Option<&str>) -> Instant {
    let secs = expires_in
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_TOKEN_TTL_SECS);
    Instant::now() + Duration::from_secs(secs)
}

fn map_request_error(err: reqwest::Error) -> IdentityError {
    if err.is_timeout() {
        IdentityError::Network("identity provider request timed out.".to_string())
    } else {
        IdentityError::Network(format!("unable to reach the identity provider: {err}"))
    }
}

/// Extracts the provider error code from `{"error": {"message": "CODE"}}`.
fn provider_error_code(body: &Value) -> Option<&str> {
    body.get("error")
        .and_then(|error| error.get("message").or(Some(error)))
        .and_then(Value::as_str)
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, IdentityError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| IdentityError::Network(format!("failed to read response: {err}")))?;

    if !status.is_success() {
        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
        return Err(match provider_error_code(&parsed) {
            Some(code) => IdentityError::from_code(code),
            None => IdentityError::Response(format!("identity provider returned {status}")),
        });
    }

    serde_json::from_str(&body)
        .map_err(|err| IdentityError::Response(format!("failed to decode response: {err}")))
}
