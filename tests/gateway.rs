#![allow(clippy::unwrap_used)]

use portalgate::{
    api::{classify_transport_message, ApiError, ApiGateway, RequestOptions},
    backend::PortalApi,
    config::PortalConfig,
    identity::{memory::InMemoryIdentity, Session},
    profile::Profile,
};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use std::{net::TcpListener, sync::Arc, time::Duration};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn gateway(config: &PortalConfig) -> (ApiGateway, Arc<InMemoryIdentity>) {
    let identity = Arc::new(InMemoryIdentity::with_session(
        Session::new("uid-1"),
        SecretString::from("token-1"),
    ));
    (ApiGateway::new(config, identity.clone()).unwrap(), identity)
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct DashboardStats {
    total_employees: u32,
}

#[tokio::test]
async fn typed_decode_through_gateway() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/owner/dashboard-stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"totalEmployees": 12}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/owner/employees"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "subscription expired"
        })))
        .mount(&server)
        .await;

    let (gateway, _) = gateway(&PortalConfig::new(server.uri()));
    let api = PortalApi::new(Arc::new(gateway));

    let stats: DashboardStats = api.owner().dashboard_stats().await.unwrap().decode().unwrap();
    assert_eq!(stats, DashboardStats { total_employees: 12 });

    let err = api
        .owner()
        .employees()
        .await
        .unwrap()
        .decode::<Vec<Profile>>()
        .unwrap_err();
    assert_eq!(err, ApiError::Rejected("subscription expired".to_string()));
}

#[tokio::test]
async fn every_request_reads_a_fresh_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/company/settings"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"v": 1}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/company/settings"))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"v": 2}})))
        .expect(1)
        .mount(&server)
        .await;

    let (gateway, identity) = gateway(&PortalConfig::new(server.uri()));
    let first = gateway.get("/api/company/settings").await.unwrap();
    identity.set_session(Session::new("uid-1"), SecretString::from("token-2"));
    let second = gateway
        .request("/api/company/settings", RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(first.data, Some(json!({"v": 1})));
    assert_eq!(second.data, Some(json!({"v": 2})));
    assert_eq!(identity.token_requests(), 2);
}

#[tokio::test]
async fn slow_backend_times_out_as_network_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/profile"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let config = PortalConfig::new(server.uri()).with_timeout(Some(Duration::from_millis(200)));
    let (gateway, _) = gateway(&config);
    let err = gateway.get("/api/users/profile").await.unwrap_err();

    assert!(err.is_network());
    assert_eq!(
        err.to_string(),
        format!("Network error: request to {} timed out", server.uri())
    );
}

#[test]
fn failed_to_fetch_message_is_a_network_error() {
    let err = classify_transport_message("TypeError: Failed to fetch", "https://api.portal.test");
    assert!(err.to_string().starts_with("Network error:"));
    assert!(err.to_string().contains("https://api.portal.test"));
}
