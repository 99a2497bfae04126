use super::{required_id, to_body, with_query};
use crate::api::{ApiError, ApiGateway, ApiResponse};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};

/// Account created by a company administrator.
#[derive(Debug)]
pub struct NewCompanyUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub password: SecretString,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewCompanyUserBody<'a> {
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    phone: &'a str,
    password: &'a str,
}

pub struct CompanyClient<'a> {
    gateway: &'a ApiGateway,
}

impl<'a> CompanyClient<'a> {
    pub(super) fn new(gateway: &'a ApiGateway) -> Self {
        Self { gateway }
    }

    /// # Errors
    /// Any gateway error.
    pub async fn users(&self) -> Result<ApiResponse, ApiError> {
        self.gateway.get("/api/company/users").await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn create_user(&self, user: &NewCompanyUser) -> Result<ApiResponse, ApiError> {
        let body = to_body(&NewCompanyUserBody {
            email: &user.email,
            first_name: &user.first_name,
            last_name: &user.last_name,
            phone: &user.phone,
            password: user.password.expose_secret(),
        })?;
        self.gateway.post("/api/company/users", body).await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn dashboard(&self) -> Result<ApiResponse, ApiError> {
        self.gateway.get("/api/company/dashboard").await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn analytics(&self, period: Option<&str>) -> Result<ApiResponse, ApiError> {
        let endpoint = with_query("/api/company/analytics", &[("period", period)]);
        self.gateway.get(&endpoint).await
    }

    /// # Errors
    /// Returns `ApiError::Request` for a blank user id, otherwise any gateway error.
    pub async fn set_user_status(
        &self,
        user_id: &str,
        is_active: bool,
    ) -> Result<ApiResponse, ApiError> {
        let user_id = required_id(user_id, "User id")?;
        self.gateway
            .patch(
                &format!("/api/company/users/{user_id}/status"),
                json!({ "isActive": is_active }),
            )
            .await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn settings(&self) -> Result<ApiResponse, ApiError> {
        self.gateway.get("/api/company/settings").await
    }

    /// # Errors
    /// Any gateway error.
    pub async fn update_settings(&self, changes: Value) -> Result<ApiResponse, ApiError> {
        self.gateway.patch("/api/company/settings", changes).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{
        api::ApiGateway,
        backend::PortalApi,
        config::PortalConfig,
        identity::{memory::InMemoryIdentity, Session},
    };
    use secrecy::SecretString;
    use serde_json::json;
    use std::{net::TcpListener, sync::Arc};
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn api(server: &MockServer) -> PortalApi {
        let identity = Arc::new(InMemoryIdentity::with_session(
            Session::new("uid-owner"),
            SecretString::from("token-owner"),
        ));
        let gateway = ApiGateway::new(&PortalConfig::new(server.uri()), identity).unwrap();
        PortalApi::new(Arc::new(gateway))
    }

    #[tokio::test]
    async fn user_status_is_patched() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/company/users/u-42/status"))
            .and(header("authorization", "Bearer token-owner"))
            .and(body_json(json!({"isActive": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": "u-42", "isActive": false}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = api(&server)
            .company()
            .set_user_status(" u-42 ", false)
            .await
            .unwrap();
        assert_eq!(response.data, Some(json!({"id": "u-42", "isActive": false})));
    }

    #[tokio::test]
    async fn analytics_period_is_a_query_parameter() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/company/analytics"))
            .and(query_param("period", "7d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"total": 3}})))
            .expect(1)
            .mount(&server)
            .await;

        let response = api(&server).company().analytics(Some("7d")).await.unwrap();
        assert_eq!(response.data, Some(json!({"total": 3})));
    }

    #[tokio::test]
    async fn created_user_is_sent_in_camel_case() {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/company/users"))
            .and(body_json(json!({
                "email": "grace@acme.test",
                "firstName": "Grace",
                "lastName": "Hopper",
                "phone": "+15550100",
                "password": "cobol-1959",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true, "data": {"id": "u-7"}})))
            .expect(1)
            .mount(&server)
            .await;

        let user = super::NewCompanyUser {
            email: "grace@acme.test".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            phone: "+15550100".to_string(),
            password: SecretString::from("cobol-1959"),
        };
        let response = api(&server).company().create_user(&user).await.unwrap();
        assert_eq!(response.data, Some(json!({"id": "u-7"})));
    }
}
