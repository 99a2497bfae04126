use super::with_query;
use crate::api::{ApiError, ApiGateway, ApiResponse};

pub struct OwnerClient<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> OwnerClient<'a> {
    pub(super) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// # Errors
    /// Any gateway error.
    pub async fn dashboard_stats(&self) -> Result<ApiResponse, ApiError> {
        self.gateway.get("/api/owner/dashboard-stats").await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn employees(&self) -> Result<ApiResponse, ApiError> {
        self.gateway.get("/api/owner/employees").await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn financial_reports(&self, period: &str) -> Result<ApiResponse, ApiError> {
        let endpoint = with_query("/api/owner/financial-reports", &[("period", Some(period))]);
        self.gateway.get(&endpoint).await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn analytics(&self) -> Result<ApiResponse, ApiError> {
        self.gateway.get("/api/owner/analytics").await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn export_performance_report(&self) -> Result<ApiResponse, ApiError> {
        self.gateway.get("/api/owner/employees/export").await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn export_financial_report(
        &self,
        period: &str,
        format: &str,
    ) -> Result<ApiResponse, ApiError> {
        let endpoint = with_query(
            "/api/owner/financial-reports/export",
            &[("period", Some(period)), ("format", Some(format))],
        );
        self.gateway.get(&endpoint).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{
        api::ApiGateway, backend::PortalApi, config::PortalConfig,
        identity::memory::InMemoryIdentity,
    };
    use serde_json::json;
    use std::{net::TcpListener, sync::Arc};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn api(server: &MockServer) -> PortalApi {
        let identity = Arc::new(InMemoryIdentity::new());
        let gateway = ApiGateway::new(&PortalConfig::new(server.uri()), identity).unwrap();
        PortalApi::new(Arc::new(gateway))
    }

    #[tokio::test]
    async fn export_financial_report_encodes_query() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/owner/financial-reports/export"))
            .and(query_param("period", "last 30 days"))
            .and(query_param("format", "csv&pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {"url": "r.csv"}})))
            .expect(1)
            .mount(&server)
            .await;

        let response = api(&server)
            .owner()
            .export_financial_report("last 30 days", "csv&pdf")
            .await
            .unwrap();
        assert_eq!(response.data, Some(json!({"url": "r.csv"})));
    }

    #[tokio::test]
    async fn financial_reports_sends_period() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/owner/financial-reports"))
            .and(query_param("period", "quarter"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let response = api(&server)
            .owner()
            .financial_reports("quarter")
            .await
            .unwrap();
        assert_eq!(response.data, Some(json!([])));
    }
}
