//! `HttpTransport` against a throwaway axum server.

use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rbac_sync_client::config::ClientConfig;
use rbac_sync_client::error::ClientError;
use rbac_sync_client::transport::{HttpTransport, SyncTransport};
use rbac_sync_core::sync::{BatchResponse, OperationDescriptor, OperationResult};
use serde_json::{json, Value};

/// Serve `router` on an ephemeral port and return a config pointing at it.
async fn serve(router: Router) -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    ClientConfig {
        api_url: format!("http://{addr}"),
        request_timeout: Duration::from_secs(5),
        ..ClientConfig::default()
    }
}

async fn echo_batch(Json(operations): Json<Vec<OperationDescriptor>>) -> Json<BatchResponse> {
    let results = operations
        .iter()
        .map(|op| match op.entity_type.as_str() {
            "roles" => OperationResult::failed(op, "boom"),
            _ => OperationResult::succeeded(op, op.data.clone()),
        })
        .collect();
    Json(BatchResponse::from_results(results))
}

#[tokio::test]
async fn submit_posts_the_batch_and_parses_results() {
    let config = serve(Router::new().route("/api/v1/sync", post(echo_batch))).await;
    let transport = HttpTransport::new(&config).unwrap();

    let operations: Vec<OperationDescriptor> = serde_json::from_value(json!([
        {"op": "PUT", "type": "users", "id": "u1", "data": {"id": "u1", "name": "Ada"}},
        {"op": "DELETE", "type": "roles", "id": "r1", "data": null}
    ]))
    .unwrap();

    let response = transport.submit(&operations).await.unwrap();
    assert!(response.success);
    assert_eq!(response.processed, 2);
    assert_eq!(response.results[0].result.as_ref().unwrap()["name"], "Ada");
    assert_eq!(response.failed().count(), 1);
}

#[tokio::test]
async fn non_success_status_is_an_upload_error() {
    let router = Router::new().route(
        "/api/v1/sync",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to process sync data", "details": "bad"})),
            )
        }),
    );
    let config = serve(router).await;
    let transport = HttpTransport::new(&config).unwrap();

    let result = transport.submit(&[]).await;
    let body = assert_matches!(result, Err(ClientError::UploadRejected { status: 500, body }) => body);
    assert!(body.contains("Failed to process sync data"));
}

#[tokio::test]
async fn credentials_are_fetched_from_the_api() {
    let router = Router::new().route(
        "/api/v1/sync/credentials",
        get(|| async {
            Json(json!({
                "endpoint": "https://sync.test",
                "token": "tok",
                "userId": "example-user-id"
            }))
        }),
    );
    let config = serve(router).await;
    let transport = HttpTransport::new(&config).unwrap();

    let credentials = transport.fetch_credentials().await.unwrap();
    assert_eq!(credentials.endpoint, "https://sync.test");
    assert_eq!(credentials.token, "tok");
    assert_eq!(credentials.user_id, "example-user-id");
}

#[tokio::test]
async fn unconfigured_credentials_surface_status() {
    let router = Router::new().route(
        "/api/v1/sync/credentials",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json::<Value>(json!({"error": "Sync service not configured"})),
            )
        }),
    );
    let config = serve(router).await;
    let transport = HttpTransport::new(&config).unwrap();

    let result = transport.fetch_credentials().await;
    assert_matches!(result, Err(ClientError::CredentialsUnavailable { status: 500, .. }));
}

#[tokio::test]
async fn unreachable_server_is_an_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig {
        api_url: format!("http://{addr}"),
        request_timeout: Duration::from_secs(2),
        ..ClientConfig::default()
    };
    let transport = HttpTransport::new(&config).unwrap();

    let result = transport.submit(&[]).await;
    assert_matches!(result, Err(ClientError::Http(_)));
}
