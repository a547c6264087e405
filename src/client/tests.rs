//! Tests for the client surface

use super::*;
use async_trait::async_trait;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Order {
    id: i64,
    #[serde(default)]
    status: Option<String>,
}

fn client_for(uri: &str) -> DbFlareClient {
    DbFlareClient::new(ClientConfig::builder().base_url(uri).build()).unwrap()
}

fn no_params() -> ValueMap {
    ValueMap::new()
}

fn params(pairs: &[(&str, Value)]) -> ValueMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

/// Transport that only counts invocations; used to prove config checks run
/// before any network traffic.
#[derive(Default)]
struct CountingTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(&self, _request: &RequestSpec) -> crate::error::Result<crate::transport::RawResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(crate::transport::RawResponse {
            status: 200,
            body: Bytes::from_static(b"null"),
        })
    }
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_build_rejects_invalid_update_override() {
    let config = ClientConfig::builder()
        .base_url("http://localhost")
        .verb_overrides(VerbOverrides::default().update(reqwest::Method::DELETE))
        .build();
    let err = DbFlareClient::new(config).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_build_accepts_post_update_override() {
    let config = ClientConfig::builder()
        .base_url("http://localhost")
        .verb_overrides(VerbOverrides::default().update(reqwest::Method::POST))
        .build();
    assert!(DbFlareClient::new(config).is_ok());
}

#[test]
fn test_build_requires_base_url() {
    let err = DbFlareClient::new(ClientConfig::builder().build()).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));

    let err = DbFlareClient::new(ClientConfig::builder().base_url("not a url").build())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

// ============================================================================
// API key checkpoint
// ============================================================================

#[tokio::test]
async fn test_api_key_gate_blocks_before_network() {
    let transport = Arc::new(CountingTransport::default());
    let config = ClientConfig::builder()
        .base_url("http://localhost")
        .api_key_required(true)
        .build();
    let client = DbFlareClient::with_transport(config, transport.clone()).unwrap();

    let err = client.zget_one::<Order>("orders", &no_params()).await.unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);

    // A blank key is as bad as a missing one
    let config = ClientConfig::builder()
        .base_url("http://localhost")
        .api_key_required(true)
        .api_key("   ")
        .build();
    let client = DbFlareClient::with_transport(config, transport.clone()).unwrap();
    let err = client.zdelete("orders", &no_params()).await.unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_api_key_header_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .and(header("Authorization", "secret123"))
        .and(header("accept", "application/json;charset=UTF-8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 1}})))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .api_key_required(true)
        .api_key("secret123")
        .build();
    let client = DbFlareClient::new(config).unwrap();

    let order: Option<Order> = client.zget_one("orders", &no_params()).await.unwrap();
    assert_eq!(order.unwrap().id, 1);
}

// ============================================================================
// Retrieval
// ============================================================================

#[tokio::test]
async fn test_zget_one_unwraps_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .and(query_param("eid", "orders"))
        .and(query_param("id", "7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"id": 7, "status": "open"}})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let order: Option<Order> = client
        .zget_one("orders", &params(&[("id", json!(7))]))
        .await
        .unwrap();
    assert_eq!(
        order,
        Some(Order {
            id: 7,
            status: Some("open".to_string())
        })
    );
}

#[tokio::test]
async fn test_zget_list_paged_orders_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .and(query_param("eid", "orders"))
        .and(query_param("status", "open"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"id": 1}, {"id": 2}], "total": 2})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let mut paging = Paging::new(1, 0, 25);
    let rows = client
        .zget_list_map_paged("orders", &params(&[("status", json!("open"))]), &mut paging)
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("id"), Some(&json!(1)));
    assert_eq!(rows[1].get("id"), Some(&json!(2)));
    assert_eq!(paging.total, 2);
}

#[tokio::test]
async fn test_zget_list_filtered_repeats_query_keys() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .and(query_param("eid", "orders"))
        .and(query_param("status", "open"))
        .and(query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 1}]})))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let mut filters = MultiValueMap::new();
    filters.insert(
        "status".to_string(),
        vec!["open".to_string(), "pending".to_string()],
    );
    let orders: Vec<Order> = client
        .zget_list_filtered("orders", &no_params(), &filters)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn test_zget_list_with_assembler() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"id": 5}, {"id": 6}], "total": 40})),
        )
        .mount(&server)
        .await;

    let assembler = |element: &Value| -> crate::error::Result<i64> {
        element
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::decode("missing id"))
    };

    let client = client_for(&server.uri());
    let mut paging = Paging::new(2, 20, 20);
    let ids = client
        .zget_list_paged_with("orders", &no_params(), &mut paging, &assembler)
        .await
        .unwrap();
    assert_eq!(ids, vec![5, 6]);
    assert_eq!(paging.total, 40);
}

#[tokio::test]
async fn test_zget_scalars() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .and(query_param("eid", "order_count"))
        .respond_with(ResponseTemplate::new(200).set_body_string("42"))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    assert_eq!(client.zget_i64("order_count", &no_params()).await.unwrap(), Some(42));
    assert_eq!(
        client.zget_f64("order_count", &no_params()).await.unwrap(),
        Some(42.0)
    );
    assert_eq!(
        client.zget_string("order_count", &no_params()).await.unwrap(),
        Some("42".to_string())
    );
}

#[tokio::test]
async fn test_zget_json_passthrough() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [1, 2], "total": 2})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let text = client.zget_json("orders", &no_params()).await.unwrap().unwrap();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, json!({"data": [1, 2], "total": 2}));
}

#[tokio::test]
async fn test_result_generation_unwraps_result_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"id": 9}})))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .payload_key(PayloadKey::Result)
        .build();
    let client = DbFlareClient::new(config).unwrap();
    let order: Option<Order> = client.zget_one("orders", &no_params()).await.unwrap();
    assert_eq!(order.unwrap().id, 9);
}

// ============================================================================
// Error surfacing
// ============================================================================

#[tokio::test]
async fn test_401_maps_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.zget_one::<Order>("orders", &no_params()).await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_service_error_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"errors": ["eid is required"]})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.zget_list::<Order>("", &no_params()).await.unwrap_err();
    assert_eq!(err.service_errors(), ["eid is required"]);
}

#[tokio::test]
async fn test_non_2xx_maps_to_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.zget_one::<Order>("orders", &no_params()).await.unwrap_err();
    match err {
        Error::Transport { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "down for maintenance");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_zinsert_posts_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zinsert"))
        .and(query_param("eid", "orders"))
        .and(body_json(json!([{"id": 1, "status": "open"}])))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [{"id": 1, "status": "open"}]})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let stored: Option<Order> = client
        .zinsert_one(
            "orders",
            &Order {
                id: 1,
                status: Some("open".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(stored.unwrap().id, 1);
}

#[tokio::test]
async fn test_zupdate_defaults_to_put() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/zupdate"))
        .and(query_param("eid", "orders"))
        .and(query_param("id", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 1, "status": "closed"}})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let updated: Option<Order> = client
        .zupdate_one(
            "orders",
            &params(&[("id", json!(1))]),
            &Order {
                id: 1,
                status: Some("closed".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.unwrap().status.as_deref(), Some("closed"));
}

#[tokio::test]
async fn test_zupdate_override_dispatches_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/zupdate"))
        .and(query_param("eid", "orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .verb_overrides(VerbOverrides::default().update(reqwest::Method::POST))
        .build();
    let client = DbFlareClient::new(config).unwrap();
    let updated: Vec<Order> = client
        .zupdate("orders", &no_params(), &[Order { id: 1, status: None }])
        .await
        .unwrap();
    assert!(updated.is_empty());
}

#[tokio::test]
async fn test_zdelete_defaults_to_delete_verb() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/zdelete"))
        .and(query_param("eid", "orders"))
        .and(query_param("id", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    client
        .zdelete("orders", &params(&[("id", json!(3))]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_zdelete_override_dispatches_get() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zdelete"))
        .and(query_param("eid", "orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"id": 3}})))
        .mount(&server)
        .await;

    let config = ClientConfig::builder()
        .base_url(server.uri())
        .verb_overrides(VerbOverrides::default().delete(reqwest::Method::GET))
        .build();
    let client = DbFlareClient::new(config).unwrap();
    let removed = client.zdelete_map("orders", &no_params()).await.unwrap();
    assert_eq!(removed.unwrap().get("id"), Some(&json!(3)));
}

#[tokio::test]
async fn test_zdelete_surfaces_service_errors() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/zdelete"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"errors": ["row is referenced"]})),
        )
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.zdelete("orders", &no_params()).await.unwrap_err();
    assert_eq!(err.service_errors(), ["row is referenced"]);
}

// ============================================================================
// Raw escape hatches
// ============================================================================

#[tokio::test]
async fn test_get_raw_substitutes_route_templates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/zget/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 1}]})))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let mut route = StringMap::new();
    route.insert("eid".to_string(), "orders".to_string());
    let root = client
        .get_raw("/zget/{eid}", &route, &no_params(), None)
        .await
        .unwrap();

    let orders: Vec<Order> = client.coercer().to_list(root.as_ref()).unwrap();
    assert_eq!(orders.len(), 1);
}
