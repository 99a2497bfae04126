//! Thin clients for the portal backend's business endpoints. Endpoint paths
//! live here; every call goes through the shared [`ApiGateway`], so tokens,
//! timeouts and response normalization behave the same as profile sync.
//! The backend enforces authorization; these helpers only shape requests.

mod company;
mod owner;
mod transactions;
mod users;

pub use company::{CompanyClient, NewCompanyUser};
pub use owner::OwnerClient;
pub use transactions::{NewTransaction, TransactionsClient, DEFAULT_PAGE_SIZE};
pub use users::UsersClient;

use crate::api::{ApiError, ApiGateway};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use url::form_urlencoded;

/// Entry point to the backend endpoint groups.
#[derive(Clone)]
pub struct PortalApi {
    gateway: Arc<ApiGateway>,
}

impl PortalApi {
    #[must_use]
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub fn users(&self) -> UsersClient<'_> {
        UsersClient::new(&self.gateway)
    }

    #[must_use]
    pub fn company(&self) -> CompanyClient<'_> {
        CompanyClient::new(&self.gateway)
    }

    #[must_use]
    pub fn owner(&self) -> OwnerClient<'_> {
        OwnerClient::new(&self.gateway)
    }

    #[must_use]
    pub fn transactions(&self) -> TransactionsClient<'_> {
        TransactionsClient::new(&self.gateway)
    }
}

/// Appends URL-encoded query parameters, skipping unset ones.
fn with_query(path: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in params {
        if let Some(value) = value {
            serializer.append_pair(key, value);
            any = true;
        }
    }

    if any {
        format!("{path}?{}", serializer.finish())
    } else {
        path.to_string()
    }
}

/// Rejects blank path identifiers before they reach the URL.
fn required_id<'a>(value: &'a str, label: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Request(format!("{label} is required.")));
    }
    Ok(trimmed)
}

fn to_body<T: Serialize>(body: &T) -> Result<Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|err| ApiError::Request(format!("failed to encode request: {err}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn query_skips_unset_values_and_encodes() {
        assert_eq!(
            with_query("/api/company/analytics", &[("period", None)]),
            "/api/company/analytics"
        );
        assert_eq!(
            with_query(
                "/api/owner/financial-reports/export",
                &[("period", Some("last 30d")), ("format", Some("csv"))]
            ),
            "/api/owner/financial-reports/export?period=last+30d&format=csv"
        );
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert_eq!(required_id(" u1 ", "User id").unwrap(), "u1");
        assert_eq!(
            required_id("  ", "User id").unwrap_err(),
            ApiError::Request("User id is required.".to_string())
        );
    }
}
