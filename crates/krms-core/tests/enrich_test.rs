#![allow(clippy::unwrap_used)]
// Enrichment stage against a mocked geolocation service.

use std::time::Duration;

use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use krms_api::{IpInfoClient, RetryPolicy, TransportConfig};
use krms_core::{DeviceRecord, Enricher, IpCache};

fn client(server: &MockServer) -> IpInfoClient {
    IpInfoClient::new(
        Url::parse(&server.uri()).unwrap(),
        Some("geo-token".to_string().into()),
        &TransportConfig::default(),
    )
    .unwrap()
    .with_retry(RetryPolicy {
        max_attempts: 1,
        backoff: Duration::from_millis(1),
    })
}

fn device(id: &str, ip: Value) -> DeviceRecord {
    serde_json::from_value(json!({ "device_id": id, "locationIp": ip })).unwrap()
}

async fn mount_us(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/203.0.113.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "203.0.113.5",
            "city": "Mountain View",
            "region": "California",
            "country": "US",
            "loc": "37.4056,-122.0775"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_enrich_preserves_order_and_length() {
    let server = MockServer::start().await;
    mount_us(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/198.51.100.7"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut enricher = Enricher::new(&client, IpCache::in_memory());
    let enriched = enricher
        .enrich(vec![
            device("a", json!("203.0.113.5")),
            device("b", json!("not-an-ip")),
            device("c", Value::Null),
            device("d", json!("198.51.100.7")),
        ])
        .await;

    let ids: Vec<&str> = enriched.iter().map(|r| r.device.id().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);

    let us = &enriched[0].geo;
    assert_eq!(us.country, "US");
    assert_eq!(us.city, "Mountain View");
    assert_eq!(us.region, "California");
    assert_eq!(us.latitude, Some(37.4056));
    assert_eq!(us.longitude, Some(-122.0775));

    assert!(enriched[1].geo.is_empty());
    assert!(enriched[2].geo.is_empty());
    assert!(enriched[3].geo.is_empty());
}

#[tokio::test]
async fn test_repeated_ip_is_looked_up_once() {
    let server = MockServer::start().await;
    mount_us(&server, 1).await;

    let client = client(&server);
    let mut enricher = Enricher::new(&client, IpCache::in_memory());
    let enriched = enricher
        .enrich(vec![
            device("a", json!("203.0.113.5")),
            device("b", json!("203.0.113.5")),
        ])
        .await;

    assert_eq!(enriched[0].geo, enriched[1].geo);
    assert_eq!(enricher.cache().len(), 1);
}

#[tokio::test]
async fn test_failed_lookup_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/198.51.100.7"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let mut enricher = Enricher::new(&client, IpCache::in_memory());
    enricher
        .enrich(vec![
            device("a", json!("198.51.100.7")),
            device("b", json!("198.51.100.7")),
        ])
        .await;

    assert!(enricher.cache().is_empty());
}

#[tokio::test]
async fn test_cache_file_is_reused_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("ip_info.json");

    let first = MockServer::start().await;
    mount_us(&first, 1).await;
    let first_client = client(&first);
    let mut enricher = Enricher::new(&first_client, IpCache::load(&cache_path));
    enricher.enrich(vec![device("a", json!("203.0.113.5"))]).await;
    assert!(cache_path.exists());

    // Second run: the service must not be called.
    let second = MockServer::start().await;
    mount_us(&second, 0).await;
    let second_client = client(&second);
    let cache = IpCache::load(&cache_path);
    assert_eq!(cache.len(), 1);
    let mut enricher = Enricher::new(&second_client, cache);
    let enriched = enricher.enrich(vec![device("a", json!("203.0.113.5"))]).await;

    assert_eq!(enriched[0].geo.country, "US");
}

#[tokio::test]
async fn test_corrupt_cache_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("ip_info.json");
    std::fs::write(&cache_path, "{ not json").unwrap();

    let cache = IpCache::load(&cache_path);
    assert!(cache.is_empty());
    assert_eq!(cache.path(), Some(cache_path.as_path()));
}
