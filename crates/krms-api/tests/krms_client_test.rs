#![allow(clippy::unwrap_used)]
// Integration tests for `KrmsClient` using wiremock.

use std::time::Duration;

use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use krms_api::{Credentials, DeviceQuery, Error, KrmsClient, RetryPolicy};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, KrmsClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = KrmsClient::with_client(reqwest::Client::new(), base_url).with_retry(
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        },
    );
    (server, client)
}

fn credentials() -> Credentials {
    Credentials::new(
        "ops",
        "test-password".to_string().into(),
        "client-key".to_string().into(),
    )
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": "success", "token": "tok-1" })),
        )
        .mount(server)
        .await;
}

fn device(n: u64) -> Value {
    json!({ "device_id": format!("dev-{n}"), "locationIp": "203.0.113.5", "online": true })
}

/// Serves `total` devices in pages sized by the request's `limit`.
struct PagedDevices {
    total: u64,
}

impl Respond for PagedDevices {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let page = body["page"].as_u64().unwrap();
        let limit = body["limit"].as_u64().unwrap();
        let start = (page - 1) * limit;
        let end = (start + limit).min(self.total);
        let data: Vec<Value> = (start..end).map(device).collect();
        ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
    }
}

/// Serves `total` devices, never more than `cap` per page whatever the
/// requested `limit`. Pages are numbered from 1 in steps of `cap`.
struct CappedPages {
    total: u64,
    cap: u64,
}

impl Respond for CappedPages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let page = body["page"].as_u64().unwrap();
        let size = body["limit"].as_u64().unwrap().min(self.cap);
        let start = ((page - 1) * size).min(self.total);
        let end = (start + size).min(self.total);
        let data: Vec<Value> = (start..end).map(device).collect();
        ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
    }
}

fn ids(devices: &[krms_api::DeviceObject]) -> Vec<String> {
    devices
        .iter()
        .map(|d| d["device_id"].as_str().unwrap().to_owned())
        .collect()
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(body_partial_json(json!({
            "user": "ops",
            "password": "test-password",
            "clientKey": "client-key"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": "success", "token": "tok-1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    assert!(client.is_authenticated());
}

#[tokio::test]
async fn test_login_rejected_code() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": "fail", "message": "bad credentials" })),
        )
        .mount(&server)
        .await;

    let result = client.login(&credentials()).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("fail"), "unexpected message: {message}");
            assert!(message.contains("bad credentials"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_login_http_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client.login(&credentials()).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_profile_requires_login() {
    let (_server, client) = setup().await;
    let result = client.profile().await;
    assert!(matches!(result, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_profile_sends_bearer_token() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/profile"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user": "ops" })))
        .expect(1)
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let profile = client.profile().await.unwrap();
    assert_eq!(profile["user"], "ops");
}

// ── Device tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_device_page_request_shape() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(json!({
            "page": 1,
            "limit": 50,
            "keyword": {},
            "orders": ["syncTime DESC"]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [device(0)], "total": 1 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let devices = client
        .list_devices(DeviceQuery::new(1, 50, vec!["syncTime DESC".into()]), None)
        .await
        .unwrap();

    assert_eq!(ids(&devices), vec!["dev-0"]);
}

#[tokio::test]
async fn test_pagination_preserves_order_without_gaps() {
    for limit in [1_u64, 2, 3, 7, 10, 11, 100] {
        let (server, client) = setup().await;
        mount_token(&server).await;

        Mock::given(method("POST"))
            .and(path("/api/v1/devices/connects/page"))
            .respond_with(PagedDevices { total: 10 })
            .mount(&server)
            .await;

        client.login(&credentials()).await.unwrap();
        let devices = client
            .list_devices(DeviceQuery::new(1, limit, Vec::new()), None)
            .await
            .unwrap();

        let expected: Vec<String> = (0..10).map(|n| format!("dev-{n}")).collect();
        assert_eq!(ids(&devices), expected, "page size {limit}");
    }
}

#[tokio::test]
async fn test_pagination_continues_past_server_capped_pages() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(CappedPages { total: 6, cap: 2 })
        .expect(4)
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let devices = client
        .list_devices(DeviceQuery::new(1, 5, Vec::new()), None)
        .await
        .unwrap();

    let expected: Vec<String> = (0..6).map(|n| format!("dev-{n}")).collect();
    assert_eq!(ids(&devices), expected);
}

#[tokio::test]
async fn test_pagination_from_later_start_page() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(CappedPages { total: 7, cap: 2 })
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let devices = client
        .list_devices(DeviceQuery::new(2, 4, Vec::new()), None)
        .await
        .unwrap();

    let expected: Vec<String> = (2..7).map(|n| format!("dev-{n}")).collect();
    assert_eq!(ids(&devices), expected);
}

#[tokio::test]
async fn test_pagination_stops_when_server_ignores_page() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": [device(0), device(1)] })),
        )
        .expect(2)
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let devices = client
        .list_devices(DeviceQuery::new(1, 10, Vec::new()), None)
        .await
        .unwrap();

    assert_eq!(ids(&devices), vec!["dev-0", "dev-1"]);
}

#[tokio::test]
async fn test_pagination_honours_row_cap() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(PagedDevices { total: 10 })
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let devices = client
        .list_devices(DeviceQuery::new(1, 3, Vec::new()), Some(5))
        .await
        .unwrap();

    assert_eq!(ids(&devices), vec!["dev-0", "dev-1", "dev-2", "dev-3", "dev-4"]);
}

#[tokio::test]
async fn test_empty_and_null_pages() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": null })))
        .expect(1)
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let devices = client
        .list_devices(DeviceQuery::new(1, 10, Vec::new()), None)
        .await
        .unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_device_fields_keep_api_order() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data":[{"zeta":1,"alpha":2,"device_id":"d1"}]}"#,
        ))
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let devices = client
        .list_devices(DeviceQuery::new(1, 10, Vec::new()), None)
        .await
        .unwrap();

    let keys: Vec<&str> = devices[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "device_id"]);
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_transient_page_failure_is_retried() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [device(0)] })))
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let devices = client
        .list_devices(DeviceQuery::new(1, 10, Vec::new()), None)
        .await
        .unwrap();
    assert_eq!(ids(&devices), vec!["dev-0"]);
}

#[tokio::test]
async fn test_expired_token() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let result = client
        .list_devices(DeviceQuery::new(1, 10, Vec::new()), None)
        .await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("expired"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client) = setup().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/devices/connects/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    client.login(&credentials()).await.unwrap();
    let result = client
        .list_devices(DeviceQuery::new(1, 10, Vec::new()), None)
        .await;

    match result {
        Err(Error::Deserialization { ref body, .. }) => assert!(body.contains("maintenance")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}
