use super::{required_id, to_body};
use crate::api::{ApiError, ApiGateway, ApiResponse};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub receiver_phone: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub struct TransactionsClient<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> TransactionsClient<'a> {
    pub(super) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// # Errors
    /// Any gateway error.
    pub async fn initiate(&self, transaction: &NewTransaction) -> Result<ApiResponse, ApiError> {
        self.gateway
            .post("/api/transactions/initiate", to_body(transaction)?)
            .await
    }

    /// Lists transactions, one-based `page`.
    ///
    /// # Errors
    /// Any gateway error.
    pub async fn list(&self, page: u32, limit: u32) -> Result<ApiResponse, ApiError> {
        let page = page.max(1).to_string();
        let limit = limit.max(1).to_string();
        let endpoint = super::with_query(
            "/api/transactions",
            &[("page", Some(page.as_str())), ("limit", Some(limit.as_str()))],
        );
        self.gateway.get(&endpoint).await
    }

    /// # Errors
    /// Returns `ApiError::Request` for a blank id, otherwise any gateway error.
    pub async fn get(&self, id: &str) -> Result<ApiResponse, ApiError> {
        let id = required_id(id, "Transaction id")?;
        self.gateway.get(&format!("/api/transactions/{id}")).await
    }
}
