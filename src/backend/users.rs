use crate::{
    api::{ApiError, ApiGateway, ApiResponse},
    profile::{SyncRequest, PROFILE_ENDPOINT, SYNC_ENDPOINT},
};
use serde_json::Value;

pub struct UsersClient<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> UsersClient<'a> {
    pub(super) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// # Errors
    /// Any gateway error.
    pub async fn profile(&self) -> Result<ApiResponse, ApiError> {
        self.gateway.get(PROFILE_ENDPOINT).await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn sync(&self, request: &SyncRequest) -> Result<ApiResponse, ApiError> {
        self.gateway
            .post(SYNC_ENDPOINT, super::to_body(request)?)
            .await
    }

    /// Updates editable profile fields. The backend decides which are accepted.
    ///
    /// # Errors
    /// Any gateway error.
    pub async fn update_profile(&self, changes: Value) -> Result<ApiResponse, ApiError> {
        self.gateway.put(PROFILE_ENDPOINT, changes).await
    }
}
