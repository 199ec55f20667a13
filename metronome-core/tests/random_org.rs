use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{Router, body::Bytes, http::StatusCode, routing::post};
use metronome_core::{
    config::{Credential, Range, RemoteSettings},
    error::RemoteError,
    source::{RandomOrgClient, RemoteIntegerSource},
};
use serde_json::{Value, json};
use url::Url;

/// Serves `router` on an ephemeral port and returns the invoke URL.
async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/json-rpc/1/invoke")).unwrap()
}

fn client(endpoint: Url, timeout: Duration) -> RandomOrgClient {
    RandomOrgClient::new(&RemoteSettings { endpoint, timeout }).unwrap()
}

fn credential() -> Credential {
    Credential::new("test-key").unwrap()
}

fn range() -> Range {
    Range::new(1, 10).unwrap()
}

/// Answers every request with `data`, echoing the request id.
fn answering(data: Value) -> Router {
    Router::new().route(
        "/json-rpc/1/invoke",
        post(move |body: Bytes| {
            let data = data.clone();
            async move {
                let request: Value = serde_json::from_slice(&body).unwrap();
                json!({
                    "jsonrpc": "2.0",
                    "result": {
                        "random": { "data": data, "completionTime": "2026-10-16 08:00:00Z" },
                        "bitsUsed": 4,
                        "bitsLeft": 249996,
                        "requestsLeft": 999,
                        "advisoryDelay": 0
                    },
                    "id": request["id"]
                })
                .to_string()
            }
        }),
    )
}

#[tokio::test]
async fn returns_the_served_integer() {
    let seen = Arc::new(Mutex::new(None::<Value>));
    let captured = Arc::clone(&seen);
    let router = Router::new().route(
        "/json-rpc/1/invoke",
        post(move |headers: axum::http::HeaderMap, body: Bytes| {
            let captured = Arc::clone(&captured);
            async move {
                let request: Value = serde_json::from_slice(&body).unwrap();
                assert_eq!(
                    headers.get("content-type").unwrap(),
                    "application/json-rpc"
                );
                *captured.lock().unwrap() = Some(request.clone());
                json!({
                    "jsonrpc": "2.0",
                    "result": { "random": { "data": [6] } },
                    "id": request["id"]
                })
                .to_string()
            }
        }),
    );
    let endpoint = serve(router).await;

    let value = client(endpoint, Duration::from_secs(5))
        .fetch(&credential(), range())
        .await
        .unwrap();
    assert_eq!(value, 6);

    let request = seen.lock().unwrap().take().unwrap();
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "generateIntegers");
    assert_eq!(
        request["params"],
        json!({ "apiKey": "test-key", "n": 1, "min": 1, "max": 10 })
    );
}

#[tokio::test]
async fn request_ids_increase() {
    let ids = Arc::new(Mutex::new(Vec::<Value>::new()));
    let recorded = Arc::clone(&ids);
    let router = Router::new().route(
        "/json-rpc/1/invoke",
        post(move |body: Bytes| {
            let recorded = Arc::clone(&recorded);
            async move {
                let request: Value = serde_json::from_slice(&body).unwrap();
                recorded.lock().unwrap().push(request["id"].clone());
                json!({
                    "jsonrpc": "2.0",
                    "result": { "random": { "data": [3] } },
                    "id": request["id"]
                })
                .to_string()
            }
        }),
    );
    let endpoint = serve(router).await;
    let client = client(endpoint.clone(), Duration::from_secs(5));
    assert_eq!(client.endpoint(), &endpoint);

    for _ in 0..3 {
        assert_eq!(client.fetch(&credential(), range()).await.unwrap(), 3);
    }
    assert_eq!(*ids.lock().unwrap(), vec![json!(0), json!(1), json!(2)]);
}

#[tokio::test]
async fn value_outside_range_is_a_failure() {
    let endpoint = serve(answering(json!([42]))).await;

    let err = client(endpoint, Duration::from_secs(5))
        .fetch(&credential(), range())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::OutOfRange { value: 42, .. }));
}

#[tokio::test]
async fn empty_data_is_missing_value() {
    let endpoint = serve(answering(json!([]))).await;

    let err = client(endpoint, Duration::from_secs(5))
        .fetch(&credential(), range())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::MissingValue));
}

#[tokio::test]
async fn rpc_error_object_is_surfaced() {
    let router = Router::new().route(
        "/json-rpc/1/invoke",
        post(|body: Bytes| async move {
            let request: Value = serde_json::from_slice(&body).unwrap();
            json!({
                "jsonrpc": "2.0",
                "error": { "code": 401, "message": "Parameter 'apiKey' is malformed" },
                "id": request["id"]
            })
            .to_string()
        }),
    );
    let endpoint = serve(router).await;

    let err = client(endpoint, Duration::from_secs(5))
        .fetch(&credential(), range())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Rpc { code: 401, .. }));
}

#[tokio::test]
async fn non_success_status_is_a_failure() {
    let router = Router::new().route(
        "/json-rpc/1/invoke",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
    );
    let endpoint = serve(router).await;

    let err = client(endpoint, Duration::from_secs(5))
        .fetch(&credential(), range())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RemoteError::Status(status) if status.as_u16() == 503
    ));
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let router = Router::new()
        .route("/json-rpc/1/invoke", post(|| async { "<html>oops</html>" }));
    let endpoint = serve(router).await;

    let err = client(endpoint, Duration::from_secs(5))
        .fetch(&credential(), range())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Malformed(_)));
}

#[tokio::test]
async fn mismatched_id_is_rejected() {
    let router = Router::new().route(
        "/json-rpc/1/invoke",
        post(|| async {
            json!({
                "jsonrpc": "2.0",
                "result": { "random": { "data": [5] } },
                "id": "someone-else"
            })
            .to_string()
        }),
    );
    let endpoint = serve(router).await;

    let err = client(endpoint, Duration::from_secs(5))
        .fetch(&credential(), range())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::IdMismatch { expected: 0, .. }));
}

#[tokio::test]
async fn slow_service_times_out() {
    let router = Router::new().route(
        "/json-rpc/1/invoke",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "{}"
        }),
    );
    let endpoint = serve(router).await;

    let err = client(endpoint, Duration::from_millis(200))
        .fetch(&credential(), range())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Timeout(_)));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let endpoint = Url::parse(&format!("http://{addr}/json-rpc/1/invoke")).unwrap();

    let err = client(endpoint, Duration::from_secs(5))
        .fetch(&credential(), range())
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
}
