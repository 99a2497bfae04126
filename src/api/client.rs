//! Request dispatcher. Builds the URL from the configured base, attaches the
//! bearer token and JSON headers, applies the timeout policy and hands the raw
//! body to the envelope parser.

use super::{transport::classify_transport_error, ApiError, ApiResponse};
use crate::{
    config::{build_url_with_base, origin_of, PortalConfig},
    identity::TokenProvider,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info_span, Instrument};

/// Per-call options. Headers given here override the gateway defaults.
#[derive(Clone, Debug)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn post(body: Value) -> Self {
        Self::with_body(Method::POST, body)
    }

    #[must_use]
    pub fn put(body: Value) -> Self {
        Self::with_body(Method::PUT, body)
    }

    #[must_use]
    pub fn patch(body: Value) -> Self {
        Self::with_body(Method::PATCH, body)
    }

    #[must_use]
    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            ..Self::get()
        }
    }

    fn with_body(method: Method, body: Value) -> Self {
        Self {
            method,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

pub struct ApiGateway {
    client: Client,
    base_url: String,
    origin: String,
    tokens: Arc<dyn TokenProvider>,
    timeout: Option<Duration>,
}

impl ApiGateway {
    /// Creates a gateway for the configured backend.
    ///
    /// # Errors
    /// Returns `ApiError::Request` if the HTTP client cannot be built.
    pub fn new(config: &PortalConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .map_err(|err| ApiError::Request(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            origin: origin_of(&config.api_base_url),
            tokens,
            timeout: config.request_timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn headers(&self, extra: &[(String, String)]) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let token = self
            .tokens
            .get_token()
            .await
            .map_err(|err| ApiError::Token(err.to_string()))?;
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|_| ApiError::Token("bearer token is not a valid header value".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        for (name, value) in extra {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ApiError::Request(format!("invalid header name {name}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| ApiError::Request(format!("invalid value for header {name}: {err}")))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// Performs one authenticated request and returns the normalized envelope.
    ///
    /// # Errors
    /// Returns `Network` for transport failures, `Parse` for non-JSON bodies,
    /// `Http` for non-2xx statuses, `Token` if no token could be obtained and
    /// `Request` if the request could not be built.
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let url = build_url_with_base(&self.base_url, endpoint);
        let headers = self.headers(&options.headers).await?;

        let mut builder = self.client.request(options.method.clone(), &url).headers(headers);
        if let Some(body) = &options.body {
            let payload = serde_json::to_string(body)
                .map_err(|err| ApiError::Request(format!("failed to encode request: {err}")))?;
            builder = builder.body(payload);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        debug!(method = %options.method, url = %url, "api request");
        let span = info_span!("api.request", http.method = %options.method, endpoint = %endpoint);
        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(|err| classify_transport_error(&err, &self.origin))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|err| classify_transport_error(&err, &self.origin))?;

        let envelope = ApiResponse::from_body(&body, &content_type)?;
        if !status.is_success() {
            debug!(status = status.as_u16(), url = %url, "api request failed");
            return Err(ApiError::from_status(status.as_u16(), envelope));
        }

        Ok(envelope)
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn get(&self, endpoint: &str) -> Result<ApiResponse, ApiError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn post(&self, endpoint: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.request(endpoint, RequestOptions::post(body)).await
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn put(&self, endpoint: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.request(endpoint, RequestOptions::put(body)).await
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn patch(&self, endpoint: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.request(endpoint, RequestOptions::patch(body)).await
    }

    /// # Errors
    /// See [`ApiGateway::request`].
    pub async fn delete(&self, endpoint: &str) -> Result<ApiResponse, ApiError> {
        self.request(endpoint, RequestOptions::delete()).await
    }
}
