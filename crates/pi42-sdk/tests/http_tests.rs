/*
[INPUT]:  Mock HTTP responses
[OUTPUT]: Test results for request signing, dispatch and response normalization
[POS]:    Integration tests - HTTP endpoints
[UPDATE]: When HTTP endpoints or signing rules change
*/

mod common;

use common::{TEST_API_KEY, TEST_API_SECRET, public_client, setup_mock_server, signed_client};
use pi42_sdk::{
    ApiOutcome, ClientConfig, HistoryQuery, ListenKeyProvider, OrderRequest, Params, Pi42Client,
    Pi42Error, Side, sign_payload,
};
use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio_test::assert_ok;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn single_request(server: &MockServer) -> wiremock::Request {
    let mut requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    requests.remove(0)
}

#[test]
fn test_client_creation() {
    let client = assert_ok!(Pi42Client::new());
    assert!(!client.has_credentials());

    let client = assert_ok!(Pi42Client::with_credentials(TEST_API_KEY, TEST_API_SECRET));
    assert!(client.has_credentials());
}

#[test]
fn test_client_with_config() {
    let config = ClientConfig::default();
    let _client = assert_ok!(Pi42Client::with_config(config));
}

#[tokio::test]
async fn test_signed_get_carries_query_and_signature() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/order/open-orders"))
        .and(query_param("symbol", "BTCINR"))
        .and(header("api-key", TEST_API_KEY))
        .and(header_exists("signature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"clientOrderId": "c1"}])))
        .mount(&server)
        .await;

    let client = signed_client(&server);
    let params = Params::new().with("symbol", "BTCINR");
    let value = assert_ok!(client.get("/v1/order/open-orders", params).await);
    assert_eq!(value, json!([{"clientOrderId": "c1"}]));

    let request = single_request(&server).await;
    let query = request.url.query().expect("query string");
    assert!(query.starts_with("symbol=BTCINR&timestamp="));

    let timestamp = query.trim_start_matches("symbol=BTCINR&timestamp=");
    assert!(timestamp.parse::<i64>().is_ok());

    let signature = request.headers.get("signature").unwrap().to_str().unwrap();
    assert_eq!(signature, sign_payload(TEST_API_SECRET, query).unwrap());
    assert_eq!(signature.len(), 64);
}

#[tokio::test]
async fn test_signed_post_body_is_the_signed_payload() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/order/place-order"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains(r#""timestamp":""#))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"clientOrderId": "c9"})))
        .mount(&server)
        .await;

    let client = signed_client(&server);
    let order = OrderRequest::limit("BTCINR", Side::Buy, Decimal::new(2, 3), Decimal::new(5_000_000, 0));
    let value = assert_ok!(client.place_order(&order).await);
    assert_eq!(value["clientOrderId"], "c9");

    let request = single_request(&server).await;
    let body = String::from_utf8(request.body.clone()).unwrap();
    let signature = request.headers.get("signature").unwrap().to_str().unwrap();
    assert_eq!(signature, sign_payload(TEST_API_SECRET, &body).unwrap());

    // Compact JSON, fields in request order, timestamp appended last
    assert!(!body.contains(": "));
    assert!(body.starts_with(r#"{"placeType":"ORDER_FORM","quantity":"#));
    let parsed: Value = serde_json::from_str(&body).unwrap();
    let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
    assert_eq!(keys.last().map(|k| k.as_str()), Some("timestamp"));
    assert_eq!(parsed["side"], "BUY");
    assert_eq!(parsed["type"], "LIMIT");
}

#[tokio::test]
async fn test_public_get_is_unsigned() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/market/depth/btcinr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"b": [], "a": []})))
        .mount(&server)
        .await;

    let client = public_client(&server);
    let value = assert_ok!(client.depth("BTCINR").await);
    assert_eq!(value, json!({"b": [], "a": []}));

    let request = single_request(&server).await;
    assert!(request.headers.get("signature").is_none());
    assert!(request.headers.get("api-key").is_none());
    assert!(request.url.query().is_none());
}

#[tokio::test]
async fn test_dispatch_success_outcome() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/v1/market/ticker24Hr/btcinr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"c": "100"})))
        .mount(&server)
        .await;

    let client = public_client(&server);
    let outcome = assert_ok!(
        client
            .dispatch(Method::GET, "/v1/market/ticker24Hr/btcinr", Params::new(), true)
            .await
    );
    assert_eq!(outcome, ApiOutcome::Success(json!({"c": "100"})));
}

#[tokio::test]
async fn test_dispatch_normalizes_json_error() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/order/place-order"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"message": "Insufficient margin", "code": "E1001"})),
        )
        .mount(&server)
        .await;

    let client = signed_client(&server);
    let outcome = assert_ok!(
        client
            .dispatch(Method::POST, "/v1/order/place-order", Params::new(), false)
            .await
    );
    assert_eq!(
        outcome,
        ApiOutcome::ApiFailure {
            status: 400,
            message: "Insufficient margin".to_string(),
            code: Some("E1001".to_string()),
        }
    );

    let err = outcome.into_result().unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_dispatch_normalizes_plain_text_error() {
    let server = setup_mock_server().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/positions/close-all-positions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;

    let client = signed_client(&server);
    let outcome = assert_ok!(
        client
            .dispatch(
                Method::DELETE,
                "/v1/positions/close-all-positions",
                Params::new(),
                false,
            )
            .await
    );
    assert_eq!(
        outcome,
        ApiOutcome::ApiFailure {
            status: 500,
            message: "oops".to_string(),
            code: None,
        }
    );
}

#[tokio::test]
async fn test_dispatch_transport_failure() {
    let client = Pi42Client::with_config_and_base_urls(
        ClientConfig::default(),
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
    )
    .unwrap();

    let outcome = assert_ok!(
        client
            .dispatch(Method::GET, "/v1/market/depth/btcinr", Params::new(), true)
            .await
    );
    assert!(matches!(outcome, ApiOutcome::TransportFailure(_)));
    assert!(matches!(
        outcome.into_result(),
        Err(Pi42Error::Transport(_))
    ));
}

#[tokio::test]
async fn test_authenticated_call_without_credentials() {
    let server = setup_mock_server().await;
    let client = public_client(&server);

    let err = client
        .open_orders(&HistoryQuery::new().symbol("BTCINR"))
        .await
        .unwrap_err();
    assert!(err.is_config_error());

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn test_listen_key_lifecycle() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/retail/listen-key"))
        .and(header_exists("signature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"listenKey": "lk-abc"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/retail/listen-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("OK")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/retail/listen-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("OK")))
        .expect(1)
        .mount(&server)
        .await;

    let client = signed_client(&server);
    assert_eq!(assert_ok!(client.obtain().await), "lk-abc");
    assert_ok!(client.keep_alive().await);
    assert_ok!(client.revoke().await);
}

#[tokio::test]
async fn test_listen_key_rejection_maps_to_listen_key_error() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/v1/retail/listen-key"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid API key"})))
        .mount(&server)
        .await;

    let client = signed_client(&server);
    let err = client.obtain().await.unwrap_err();
    match err {
        Pi42Error::ListenKey(message) => assert!(message.contains("Invalid API key")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_listen_key_without_credentials_is_config_error() {
    let server = setup_mock_server().await;
    let client = public_client(&server);

    let err = ListenKeyProvider::obtain(&client).await.unwrap_err();
    assert!(err.is_config_error());
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/pi42/v1/market/depth/btcinr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"b": [], "a": []})))
        .expect(1)
        .mount(&server)
        .await;

    let prefixed = format!("{}/pi42", server.uri());
    let client =
        Pi42Client::with_config_and_base_urls(ClientConfig::default(), &prefixed, &prefixed)
            .unwrap();
    assert_ok!(client.depth("BTCINR").await);
}
