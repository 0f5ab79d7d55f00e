//! HTTP integration tests for passless-core.
//!
//! These tests run a stub relying party on a local socket and drive the
//! client through `ReqwestTransport`, exercising the real wire format,
//! headers and status handling end to end with the mock authenticator.

#![cfg(feature = "network")]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use passless_core::{
    codec, ClientConfig, HttpRequest, HttpTransport, MemoryHintStore, MockPlatform,
    PasswordlessClient, PasswordlessError, ReqwestTransport, TransportConfig,
};

const API_KEY: &str = "integration-key";

/// What the stub relying party has accepted so far.
#[derive(Default)]
struct Registry {
    credential_id: Option<String>,
}

type Shared = Arc<Mutex<Registry>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("ApiKey").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"title": "Invalid API key"})),
    )
}

async fn register_begin(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    assert_eq!(body["RPID"], "app.example.com");
    assert_eq!(body["Origin"], "https://app.example.com");

    (
        StatusCode::OK,
        Json(json!({
            "sessionId": "reg-session",
            "data": {
                "challenge": codec::encode([42u8; 32]),
                "rp": {"id": "app.example.com", "name": "Example"},
                "user": {
                    "id": codec::encode(body["token"].as_str().unwrap_or_default()),
                    "name": "alice",
                    "displayName": "Alice"
                },
                "pubKeyCredParams": [{"type": "public-key", "alg": -7}],
                "authenticatorSelection": {"authenticatorAttachment": null, "residentKey": "preferred"},
                "timeout": 60000
            }
        })),
    )
}

async fn register_complete(
    State(registry): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body["sessionId"] != "reg-session" {
        return (StatusCode::BAD_REQUEST, Json(json!({"title": "Unknown session"})));
    }

    let credential = &body["response"];
    let raw_id = codec::decode(credential["rawId"].as_str().unwrap_or_default()).unwrap();
    assert_eq!(credential["id"], codec::encode(&raw_id));
    assert!(credential["response"]["attestationObject"].is_string());

    let client_data_json =
        codec::decode(credential["response"]["clientDataJSON"].as_str().unwrap()).unwrap();
    let client_data: Value = serde_json::from_slice(&client_data_json).unwrap();
    assert_eq!(client_data["type"], "webauthn.create");
    assert_eq!(client_data["challenge"], codec::encode([42u8; 32]));

    registry.lock().unwrap().credential_id = credential["id"].as_str().map(str::to_string);
    (StatusCode::OK, Json(json!({"status": "registered"})))
}

async fn signin_begin(
    State(registry): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(credential_id) = registry.lock().unwrap().credential_id.clone() else {
        return (StatusCode::NOT_FOUND, Json(json!({"title": "No credentials"})));
    };
    assert_eq!(body["username"], "alice");

    (
        StatusCode::OK,
        Json(json!({
            "sessionId": "auth-session",
            "data": {
                "challenge": codec::encode([7u8; 32]),
                "rpId": "app.example.com",
                "allowCredentials": [{"type": "public-key", "id": credential_id}],
                "userVerification": "required"
            }
        })),
    )
}

async fn signin_complete(
    State(registry): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return unauthorized();
    }
    let registered = registry.lock().unwrap().credential_id.clone();
    let credential = &body["response"];
    if body["sessionId"] != "auth-session" || credential["id"].as_str() != registered.as_deref() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"title": "Invalid assertion"})));
    }

    let authenticator_data =
        codec::decode(credential["response"]["authenticatorData"].as_str().unwrap()).unwrap();
    assert_eq!(authenticator_data.len(), 37);

    (
        StatusCode::OK,
        Json(json!({"data": {"verified": true, "token": "session-jwt"}})),
    )
}

async fn slow_begin() -> (StatusCode, Json<Value>) {
    tokio::time::sleep(Duration::from_secs(5)).await;
    (StatusCode::OK, Json(json!({})))
}

async fn echo(method: Method, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({
        "method": method.as_str(),
        "contentType": content_type,
        "body": body,
    }))
}

async fn html_error() -> impl IntoResponse {
    (StatusCode::BAD_GATEWAY, Html("<html>Bad Gateway</html>"))
}

/// Start the stub relying party on an ephemeral port.
async fn spawn_relying_party() -> SocketAddr {
    let app = Router::new()
        .route("/api/register/begin", post(register_begin))
        .route("/api/register/complete", post(register_complete))
        .route("/api/signin/begin", post(signin_begin))
        .route("/api/signin/complete", post(signin_complete))
        .route("/slow/register/begin", post(slow_begin))
        .route("/broken/signin/begin", post(html_error))
        .route("/echo", post(echo))
        .with_state(Shared::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub relying party");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

fn local_config(addr: SocketAddr, base: &str, api_key: &str) -> ClientConfig {
    ClientConfig::new(
        &format!("http://{addr}/{base}"),
        api_key,
        "https://app.example.com",
    )
    .unwrap()
    .with_transport(TransportConfig {
        timeout: Duration::from_millis(500),
        https_only: false,
    })
}

fn client(config: ClientConfig) -> PasswordlessClient {
    PasswordlessClient::builder(config)
        .platform(MockPlatform::default())
        .hint_store(MemoryHintStore::new())
        .build()
        .expect("Failed to build client")
}

// ============================================================================
// Transport
// ============================================================================

#[tokio::test]
async fn test_request_is_json_post() {
    let addr = spawn_relying_party().await;
    let transport = ReqwestTransport::new(&TransportConfig {
        timeout: Duration::from_secs(5),
        https_only: false,
    })
    .unwrap();

    let url = format!("http://{addr}/echo").parse().unwrap();
    let request = HttpRequest::post(url, json!({"token": "t"}))
        .header("Content-Type", "application/json");
    let response = transport.send(request).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body["method"], "POST");
    assert_eq!(response.body["contentType"], "application/json");
    assert_eq!(response.body["body"]["token"], "t");
}

// ============================================================================
// End-to-end
// ============================================================================

#[tokio::test]
async fn test_register_then_signin_over_http() {
    let addr = spawn_relying_party().await;
    let client = client(local_config(addr, "api", API_KEY));

    let outcome = client.register("enroll-token").await.expect("Registration failed");
    assert!(outcome.is_registered());
    assert!(client.has_passwordless_hint());

    let payload = client.signin("alice").await.expect("Sign-in failed");
    assert_eq!(payload["verified"], true);
    assert_eq!(payload["token"], "session-jwt");
}

#[tokio::test]
async fn test_signin_before_registration_fails_at_begin() {
    let addr = spawn_relying_party().await;
    let client = client(local_config(addr, "api", API_KEY));

    let err = client.signin("alice").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to begin sign-in: status 404: No credentials"
    );
}

// ============================================================================
// Transport failures
// ============================================================================

#[tokio::test]
async fn test_wrong_api_key_is_rejected() {
    let addr = spawn_relying_party().await;
    let client = client(local_config(addr, "api", "wrong-key"));

    let err = client.register("enroll-token").await.unwrap_err();
    assert!(matches!(err, PasswordlessError::BeginFailed { .. }));
    assert!(err.to_string().contains("status 401: Invalid API key"));
}

#[tokio::test]
async fn test_timeout_is_begin_failure() {
    let addr = spawn_relying_party().await;
    let client = client(local_config(addr, "slow", API_KEY));

    let err = client.register("enroll-token").await.unwrap_err();
    assert!(matches!(err, PasswordlessError::BeginFailed { .. }));
    assert!(err.to_string().contains("timed out"), "got: {err}");
}

#[tokio::test]
async fn test_non_json_error_body() {
    let addr = spawn_relying_party().await;
    let client = client(local_config(addr, "broken", API_KEY));

    let err = client.signin("alice").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to begin sign-in: status 502");
}

#[tokio::test]
async fn test_plain_http_refused_when_https_only() {
    let addr = spawn_relying_party().await;
    let config = local_config(addr, "api", API_KEY).with_transport(TransportConfig::default());
    let client = client(config);

    let err = client.register("enroll-token").await.unwrap_err();
    assert!(matches!(err, PasswordlessError::BeginFailed { .. }));
    assert!(!client.has_passwordless_hint());
}
