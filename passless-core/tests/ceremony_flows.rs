//! Ceremony flow tests for passless-core.
//!
//! These tests drive both ceremonies through the client facade with
//! in-process collaborators: a scripted relying party that records every
//! request, a scripted platform that records the options it was handed, and
//! a shared in-memory hint store.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use passless_core::{
    AssertionResponse, AttestationResponse, Ceremony, ClientConfig, CompleteFailurePolicy,
    CredentialCreationOptions, CredentialRequestOptions, HintStore, HttpRequest, HttpResponse,
    HttpTransport, MemoryHintStore, PasswordlessClient, PasswordlessError, PlatformCredential,
    PlatformCredentials, PlatformError, TransportError, HINT_NAME,
};

// ============================================================================
// Stub collaborators
// ============================================================================

/// Relying party answering from a queue of scripted responses.
#[derive(Clone, Default)]
struct ScriptedRelyingParty {
    responses: Rc<RefCell<VecDeque<Result<HttpResponse, TransportError>>>>,
    requests: Rc<RefCell<Vec<HttpRequest>>>,
}

impl ScriptedRelyingParty {
    fn respond(self, status: u16, body: Value) -> Self {
        self.responses
            .borrow_mut()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    fn fail(self, error: TransportError) -> Self {
        self.responses.borrow_mut().push_back(Err(error));
        self
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect()
    }
}

#[async_trait(?Send)]
impl HttpTransport for ScriptedRelyingParty {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request);
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response left".into())))
    }
}

/// Platform returning fixed credentials and recording what it was asked.
#[derive(Clone, Default)]
struct ScriptedPlatform {
    reject_with: Option<PlatformError>,
    create_calls: Rc<RefCell<Vec<CredentialCreationOptions>>>,
    get_calls: Rc<RefCell<Vec<CredentialRequestOptions>>>,
}

impl ScriptedPlatform {
    fn rejecting(error: PlatformError) -> Self {
        Self {
            reject_with: Some(error),
            ..Self::default()
        }
    }
}

#[async_trait(?Send)]
impl PlatformCredentials for ScriptedPlatform {
    async fn is_platform_authenticator_available(&self) -> bool {
        true
    }

    async fn create(
        &self,
        options: CredentialCreationOptions,
    ) -> Result<PlatformCredential<AttestationResponse>, PlatformError> {
        self.create_calls.borrow_mut().push(options);
        if let Some(error) = &self.reject_with {
            return Err(error.clone());
        }

        Ok(PlatformCredential {
            id: "cred1".into(),
            raw_id: vec![1, 2, 3],
            credential_type: "public-key".into(),
            response: AttestationResponse {
                client_data_json: vec![6, 7],
                attestation_object: vec![10, 11],
                transports: vec!["internal".into()],
            },
            authenticator_attachment: Some("platform".into()),
            client_extension_results: json!({}),
        })
    }

    async fn get(
        &self,
        options: CredentialRequestOptions,
    ) -> Result<PlatformCredential<AssertionResponse>, PlatformError> {
        self.get_calls.borrow_mut().push(options);
        if let Some(error) = &self.reject_with {
            return Err(error.clone());
        }

        Ok(PlatformCredential {
            id: "cred1".into(),
            raw_id: vec![1, 2, 3],
            credential_type: "public-key".into(),
            response: AssertionResponse {
                authenticator_data: vec![4, 5],
                client_data_json: vec![6, 7],
                signature: vec![8, 9],
                user_handle: None,
            },
            authenticator_attachment: None,
            client_extension_results: json!({}),
        })
    }
}

/// Hint store the test can inspect after handing it to the client.
#[derive(Clone, Default)]
struct SharedHints(Rc<MemoryHintStore>);

impl HintStore for SharedHints {
    fn set(&self, name: &str, value: &str, ttl: Option<Duration>) -> passless_core::Result<()> {
        self.0.set(name, value, ttl)
    }

    fn get(&self, name: &str) -> passless_core::Result<Option<String>> {
        self.0.get(name)
    }
}

struct Harness {
    client: PasswordlessClient,
    relying_party: ScriptedRelyingParty,
    platform: ScriptedPlatform,
    hints: SharedHints,
}

fn harness(relying_party: ScriptedRelyingParty, platform: ScriptedPlatform) -> Harness {
    harness_with_config(relying_party, platform, test_config())
}

fn harness_with_config(
    relying_party: ScriptedRelyingParty,
    platform: ScriptedPlatform,
    config: ClientConfig,
) -> Harness {
    let hints = SharedHints::default();
    let client = PasswordlessClient::builder(config)
        .transport(relying_party.clone())
        .platform(platform.clone())
        .hint_store(hints.clone())
        .build()
        .expect("Failed to build client");

    Harness {
        client,
        relying_party,
        platform,
        hints,
    }
}

fn test_config() -> ClientConfig {
    ClientConfig::new(
        "https://api.example.com/passwordless",
        "test-api-key",
        "https://app.example.com",
    )
    .unwrap()
}

fn registration_begin(selection: Value) -> Value {
    json!({
        "sessionId": "s-reg",
        "data": {
            "challenge": "AQID",
            "rp": {"id": "app.example.com", "name": "Example"},
            "user": {"id": "dXNlcg", "name": "alice", "displayName": "Alice"},
            "pubKeyCredParams": [{"type": "public-key", "alg": -7}],
            "excludeCredentials": [{"type": "public-key", "id": "BAU"}],
            "authenticatorSelection": selection
        }
    })
}

fn signin_begin() -> Value {
    json!({
        "sessionId": "s-123",
        "data": {
            "challenge": "AQID",
            "rpId": "app.example.com",
            "allowCredentials": [{"type": "public-key", "id": "AQID"}]
        }
    })
}

// ============================================================================
// Sign-in
// ============================================================================

#[tokio::test]
async fn test_signin_happy_path() {
    let relying_party = ScriptedRelyingParty::default()
        .respond(200, signin_begin())
        .respond(200, json!({"data": {"token": "session-jwt"}}));
    let h = harness(relying_party, ScriptedPlatform::default());

    let payload = h.client.signin("alice").await.expect("Sign-in failed");
    assert_eq!(payload, json!({"token": "session-jwt"}));

    let requests = h.relying_party.requests();
    assert_eq!(
        h.relying_party.paths(),
        vec!["/passwordless/signin/begin", "/passwordless/signin/complete"]
    );

    // Begin carries username, RP id and origin
    assert_eq!(
        requests[0].body,
        Some(json!({
            "username": "alice",
            "RPID": "app.example.com",
            "Origin": "https://app.example.com"
        }))
    );

    // Complete echoes the session and carries the encoded assertion
    let complete = requests[1].body.as_ref().unwrap();
    assert_eq!(complete["sessionId"], "s-123");
    assert_eq!(complete["RPID"], "app.example.com");
    assert_eq!(complete["Origin"], "https://app.example.com");
    assert_eq!(complete["response"]["id"], "cred1");
    assert_eq!(complete["response"]["rawId"], "AQID");
    assert_eq!(complete["response"]["type"], "public-key");
    assert_eq!(complete["response"]["response"]["authenticatorData"], "BAU");
    assert_eq!(complete["response"]["response"]["clientDataJSON"], "Bgc");
    assert_eq!(complete["response"]["response"]["signature"], "CAk");

    // Platform received decoded buffers
    let get_calls = h.platform.get_calls.borrow();
    assert_eq!(get_calls[0].challenge, vec![1, 2, 3]);
    assert_eq!(get_calls[0].allow_credentials[0].id, vec![1, 2, 3]);

    // Hint written
    assert_eq!(h.hints.get(HINT_NAME).unwrap().as_deref(), Some("true"));
    assert!(h.client.has_passwordless_hint());
}

#[tokio::test]
async fn test_every_request_carries_headers() {
    let relying_party = ScriptedRelyingParty::default()
        .respond(200, signin_begin())
        .respond(200, json!({}));
    let h = harness(relying_party, ScriptedPlatform::default());

    h.client.signin("alice").await.unwrap();

    for request in h.relying_party.requests() {
        assert_eq!(request.header_value("ApiKey"), Some("test-api-key"));
        assert_eq!(request.header_value("Accept"), Some("application/json"));
        assert_eq!(request.header_value("Content-Type"), Some("application/json"));
    }
}

#[tokio::test]
async fn test_signin_without_data_returns_null() {
    let relying_party = ScriptedRelyingParty::default()
        .respond(200, signin_begin())
        .respond(204, Value::Null);
    let h = harness(relying_party, ScriptedPlatform::default());

    assert_eq!(h.client.signin("").await.unwrap(), Value::Null);
    assert!(h.client.has_passwordless_hint());
}

#[tokio::test]
async fn test_signin_complete_failure_propagates() {
    let relying_party = ScriptedRelyingParty::default()
        .respond(200, signin_begin())
        .respond(401, json!({"title": "Invalid assertion"}));
    let h = harness(relying_party, ScriptedPlatform::default());

    let err = h.client.signin("alice").await.unwrap_err();
    match err {
        PasswordlessError::CompleteFailed { ceremony, reason } => {
            assert_eq!(ceremony, Ceremony::Signin);
            assert_eq!(reason, "status 401: Invalid assertion");
        }
        other => panic!("expected CompleteFailed, got {other:?}"),
    }
    assert!(!h.client.has_passwordless_hint());
}

#[tokio::test]
async fn test_signin_platform_rejection_propagates() {
    let relying_party = ScriptedRelyingParty::default().respond(200, signin_begin());
    let h = harness(
        relying_party,
        ScriptedPlatform::rejecting(PlatformError::not_allowed("cancelled")),
    );

    let err = h.client.signin("alice").await.unwrap_err();
    assert!(matches!(err, PasswordlessError::PlatformGet(_)));
    assert_eq!(err.platform_detail().unwrap().name, "NotAllowedError");
    assert_eq!(h.relying_party.requests().len(), 1, "No complete call");
}

#[tokio::test]
async fn test_signin_begin_failure_skips_platform() {
    let relying_party = ScriptedRelyingParty::default()
        .respond(404, json!({"message": "Unknown user"}));
    let h = harness(relying_party, ScriptedPlatform::default());

    let err = h.client.signin("mallory").await.unwrap_err();
    assert!(matches!(
        err,
        PasswordlessError::BeginFailed {
            ceremony: Ceremony::Signin,
            ..
        }
    ));
    assert!(err.to_string().contains("Unknown user"));
    assert!(h.platform.get_calls.borrow().is_empty());
}

#[tokio::test]
async fn test_transport_error_is_begin_failure() {
    let relying_party = ScriptedRelyingParty::default()
        .fail(TransportError::Connect("connection refused".into()));
    let h = harness(relying_party, ScriptedPlatform::default());

    let err = h.client.signin("alice").await.unwrap_err();
    assert!(matches!(err, PasswordlessError::BeginFailed { .. }));
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_malformed_begin_response_is_begin_failure() {
    let relying_party =
        ScriptedRelyingParty::default().respond(200, json!({"data": {"challenge": "AQID"}}));
    let h = harness(relying_party, ScriptedPlatform::default());

    let err = h.client.signin("alice").await.unwrap_err();
    assert!(matches!(err, PasswordlessError::BeginFailed { .. }));
}

#[tokio::test]
async fn test_malformed_challenge_is_encoding_error() {
    let relying_party = ScriptedRelyingParty::default().respond(
        200,
        json!({"sessionId": "s-1", "data": {"challenge": {"bytes": "AQID"}}}),
    );
    let h = harness(relying_party, ScriptedPlatform::default());

    let err = h.client.signin("alice").await.unwrap_err();
    assert!(matches!(err, PasswordlessError::Encoding(_)));
    assert!(h.platform.get_calls.borrow().is_empty());
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_happy_path() {
    let relying_party = ScriptedRelyingParty::default()
        .respond(200, registration_begin(json!({"residentKey": "required"})))
        .respond(200, json!({"ok": true}));
    let h = harness(relying_party, ScriptedPlatform::default());

    let outcome = h.client.register("enroll-token").await.expect("Registration failed");
    assert!(outcome.is_registered());
    assert_eq!(outcome.credential_id(), "cred1");

    let requests = h.relying_party.requests();
    assert_eq!(
        h.relying_party.paths(),
        vec![
            "/passwordless/register/begin",
            "/passwordless/register/complete"
        ]
    );
    assert_eq!(requests[0].body.as_ref().unwrap()["token"], "enroll-token");

    let complete = requests[1].body.as_ref().unwrap();
    assert_eq!(complete["sessionId"], "s-reg");
    assert_eq!(complete["response"]["rawId"], "AQID");
    assert_eq!(complete["response"]["response"]["attestationObject"], "Cgs");
    assert_eq!(complete["response"]["response"]["clientDataJSON"], "Bgc");
    assert_eq!(complete["response"]["response"]["transports"], json!(["internal"]));

    let create_calls = h.platform.create_calls.borrow();
    assert_eq!(create_calls[0].challenge, vec![1, 2, 3]);
    assert_eq!(create_calls[0].user.id, b"user".to_vec());
    assert_eq!(create_calls[0].exclude_credentials[0].id, vec![4, 5]);

    assert!(h.client.has_passwordless_hint());
}

#[tokio::test]
async fn test_register_omits_null_attachment() {
    let relying_party = ScriptedRelyingParty::default()
        .respond(
            200,
            registration_begin(json!({"authenticatorAttachment": null, "userVerification": "preferred"})),
        )
        .respond(200, json!({}));
    let h = harness(relying_party, ScriptedPlatform::default());

    h.client.register("token").await.unwrap();

    let create_calls = h.platform.create_calls.borrow();
    let options = serde_json::to_value(&create_calls[0]).unwrap();
    let selection = options["authenticatorSelection"].as_object().unwrap();
    assert!(!selection.contains_key("authenticatorAttachment"));
    assert_eq!(selection["userVerification"], "preferred");
}

#[tokio::test]
async fn test_register_complete_failure_is_swallowed_by_default() {
    let relying_party = ScriptedRelyingParty::default()
        .respond(200, registration_begin(json!({})))
        .respond(500, json!({"error": "database unavailable"}));
    let h = harness(relying_party, ScriptedPlatform::default());

    let outcome = h.client.register("token").await.expect("Swallowed failure must resolve");
    assert!(!outcome.is_registered());
    assert_eq!(outcome.credential_id(), "cred1");
    assert!(!h.client.has_passwordless_hint(), "Hint must not be written");
    assert_eq!(h.hints.get(HINT_NAME).unwrap(), None);
}

#[tokio::test]
async fn test_register_complete_failure_reported_when_strict() {
    let relying_party = ScriptedRelyingParty::default()
        .respond(200, registration_begin(json!({})))
        .respond(500, json!({"error": "database unavailable"}));
    let config = test_config().with_register_complete_failure(CompleteFailurePolicy::Report);
    let h = harness_with_config(relying_party, ScriptedPlatform::default(), config);

    let err = h.client.register("token").await.unwrap_err();
    assert!(matches!(
        err,
        PasswordlessError::CompleteFailed {
            ceremony: Ceremony::Registration,
            ..
        }
    ));
    assert!(!h.client.has_passwordless_hint());
}

#[tokio::test]
async fn test_register_platform_rejection_skips_complete() {
    let relying_party = ScriptedRelyingParty::default().respond(200, registration_begin(json!({})));
    let h = harness(
        relying_party,
        ScriptedPlatform::rejecting(PlatformError::invalid_state("already registered")),
    );

    let err = h.client.register("token").await.unwrap_err();
    assert!(err.to_string().contains("may already be registered"));
    let detail = err.platform_detail().expect("platform detail kept");
    assert_eq!(detail.name, "InvalidStateError");
    assert_eq!(detail.message, "already registered");

    assert_eq!(h.relying_party.requests().len(), 1, "No complete call");
    assert!(!h.client.has_passwordless_hint());
}

#[tokio::test]
async fn test_register_begin_failure_skips_platform() {
    let relying_party =
        ScriptedRelyingParty::default().respond(403, json!({"title": "Token expired"}));
    let h = harness(relying_party, ScriptedPlatform::default());

    let err = h.client.register("stale").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to begin registration: status 403: Token expired"
    );
    assert!(h.platform.create_calls.borrow().is_empty());
}

// ============================================================================
// Capability gate
// ============================================================================

#[tokio::test]
async fn test_unsupported_environment_makes_no_calls() {
    let relying_party = ScriptedRelyingParty::default();
    let client = PasswordlessClient::builder(test_config())
        .transport(relying_party.clone())
        .hint_store(MemoryHintStore::new())
        .build()
        .unwrap();

    assert!(matches!(
        client.assert_supported(),
        Err(PasswordlessError::UnsupportedEnvironment)
    ));
    assert!(matches!(
        client.register("token").await,
        Err(PasswordlessError::UnsupportedEnvironment)
    ));
    assert!(relying_party.requests().is_empty());
}
