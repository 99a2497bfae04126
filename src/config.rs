//! Runtime configuration for the backend gateway and identity provider. Values
//! arrive from CLI flags or `PORTALGATE_*` environment variables and are
//! normalized here (trimmed, empty treated as unset). Configuration values other
//! than the API key are public; the key is kept in a [`SecretString`].

use crate::access::SurfaceRoutes;
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Default per-request timeout in seconds; `0` disables it.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_TOKEN_URL: &str = "https://securetoken.googleapis.com";

/// Backend-facing configuration.
#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub api_base_url: String,
    pub request_timeout: Option<Duration>,
    pub routes: SurfaceRoutes,
}

impl PortalConfig {
    #[must_use]
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout: timeout_from_secs(DEFAULT_TIMEOUT_SECS),
            routes: SurfaceRoutes::default(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_routes(mut self, routes: SurfaceRoutes) -> Self {
        self.routes = routes;
        self
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

/// Identity provider configuration.
#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub identity_url: String,
    pub token_url: String,
    pub api_key: SecretString,
    pub request_timeout: Option<Duration>,
}

/// Trims a configured value and rejects empty input.
#[must_use]
pub fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Converts a seconds setting into a timeout, `0` meaning no timeout.
#[must_use]
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Builds a URL from an explicit base URL and the provided path.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Origin (`scheme://host[:port]`) of a URL, or the trimmed input if it does not parse.
#[must_use]
pub fn origin_of(url: &str) -> String {
    Url::parse(url.trim()).map_or_else(
        |_| url.trim().trim_end_matches('/').to_string(),
        |parsed| parsed.origin().ascii_serialization(),
    )
}
