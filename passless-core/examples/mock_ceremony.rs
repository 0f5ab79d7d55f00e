//! Example demonstrating ceremony tracing instrumentation.
//!
//! Runs a registration and a sign-in against an in-process relying party
//! with the mock authenticator, so every state transition is logged.
//!
//! Run with: cargo run -p passless-core --example mock_ceremony

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing_subscriber::{fmt, EnvFilter};

use passless_core::{
    codec, ClientConfig, HttpRequest, HttpResponse, HttpTransport, MockPlatform,
    PasswordlessClient, TransportError,
};

/// Relying party that issues fixed challenges and accepts every response.
struct AcceptingRelyingParty;

#[async_trait(?Send)]
impl HttpTransport for AcceptingRelyingParty {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let challenge = codec::encode([0x5au8; 32]);
        let body = match request.url.path() {
            "/register/begin" => json!({
                "sessionId": "demo-registration",
                "data": {
                    "challenge": challenge,
                    "rp": {"id": "localhost", "name": "Demo"},
                    "user": {"id": codec::encode("demo-user"), "name": "demo", "displayName": "Demo"},
                    "pubKeyCredParams": [{"type": "public-key", "alg": -7}]
                }
            }),
            "/signin/begin" => json!({
                "sessionId": "demo-signin",
                "data": {"challenge": challenge, "rpId": "localhost"}
            }),
            "/signin/complete" => json!({"data": {"welcome": "demo"}}),
            _ => Value::Null,
        };
        Ok(HttpResponse::new(200, body))
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with debug level
    fmt()
        .with_env_filter(EnvFilter::new("passless_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    println!("=== Mock Ceremony Tracing Demo ===\n");

    let config = match ClientConfig::new("https://rp.invalid/", "demo-key", "https://localhost") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return;
        }
    };
    println!("Config: {:?}\n", config);

    let client = match PasswordlessClient::builder(config)
        .transport(AcceptingRelyingParty)
        .platform(MockPlatform::default())
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    match client.register("demo-token").await {
        Ok(outcome) => {
            let raw_id = codec::decode(outcome.credential_id()).unwrap_or_default();
            println!("\n✅ Registered");
            println!("   Credential: {}", hex::encode(raw_id));
        }
        Err(e) => {
            println!("\n❌ Registration failed: {}", e);
            return;
        }
    }

    match client.signin("demo").await {
        Ok(payload) => println!("\n✅ Signed in: {}", payload),
        Err(e) => println!("\n❌ Sign-in failed: {}", e),
    }

    println!("\nHint present: {}", client.has_passwordless_hint());
}
