//! Integration tests for the relay server
//!
//! These drive the full router with `oneshot()` so raw response headers (CORS in particular)
//! can be inspected alongside the JSON bodies.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use nvrelay::test_utils::MockHttpClient;
use nvrelay::{AppState, DEFAULT_UPSTREAM_URL, build_router};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for oneshot()

fn app(mock_client: MockHttpClient) -> axum::Router {
    let app_state = AppState::with_client(DEFAULT_UPSTREAM_URL.parse().unwrap(), mock_client);
    build_router(app_state)
}

fn chat_request(origin: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("origin", origin)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_cors_preflight_from_any_origin() {
    let mock_client = MockHttpClient::new(StatusCode::OK, r#"{"response": "unused"}"#);
    let app = app(mock_client.clone());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/chat")
        .header("origin", "https://billy.example.org")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert!(headers.contains_key("access-control-allow-methods"));
    assert!(headers.contains_key("access-control-allow-headers"));

    // Preflight never reaches upstream
    assert!(mock_client.get_requests().is_empty());
}

#[tokio::test]
async fn test_cors_headers_on_success() {
    let mock_client = MockHttpClient::new(StatusCode::OK, r#"{"response": "hello"}"#);

    let response = app(mock_client)
        .oneshot(chat_request(
            "http://localhost:5173",
            json!({"message": "Hi", "apiKey": "nvapi-key"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(json_body(response).await, json!({"response": "hello"}));
}

#[tokio::test]
async fn test_cors_headers_on_validation_error() {
    let mock_client = MockHttpClient::new(StatusCode::OK, r#"{"response": "unused"}"#);

    let response = app(mock_client)
        .oneshot(chat_request("https://elsewhere.example", json!({"message": "Hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        json_body(response).await,
        json!({"error": "Missing message or API key"})
    );
}

#[tokio::test]
async fn test_cors_headers_on_upstream_error() {
    let mock_client = MockHttpClient::new(StatusCode::FORBIDDEN, "forbidden");

    let response = app(mock_client)
        .oneshot(chat_request(
            "https://elsewhere.example",
            json!({"message": "Hi", "apiKey": "nvapi-key"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        json_body(response).await,
        json!({"error": "NVIDIA API error: forbidden"})
    );
}

#[tokio::test]
async fn test_cors_headers_on_network_failure() {
    let mock_client = MockHttpClient::failing("dns error: failed to lookup address");

    let response = app(mock_client)
        .oneshot(chat_request(
            "https://elsewhere.example",
            json!({"message": "Hi", "apiKey": "nvapi-key"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        json_body(response).await,
        json!({"error": "dns error: failed to lookup address"})
    );
}

#[tokio::test]
async fn test_each_request_makes_exactly_one_upstream_call() {
    let mock_client = MockHttpClient::new(StatusCode::OK, r#"{"response": "ok"}"#);
    let app = app(mock_client.clone());

    for i in 0..3 {
        let response = app
            .clone()
            .oneshot(chat_request(
                "http://localhost",
                json!({"message": format!("message {i}"), "apiKey": format!("key-{i}")}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let requests = mock_client.get_requests();
    assert_eq!(requests.len(), 3);
    for (i, request) in requests.iter().enumerate() {
        assert_eq!(
            request.header("authorization"),
            Some(format!("Bearer key-{i}").as_str())
        );
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body["messages"][0]["content"], format!("message {i}"));
    }
}
