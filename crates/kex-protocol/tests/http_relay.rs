//! # HTTP Relay Adapter Tests
//!
//! Runs `HttpRelayClient` against a mock relay and checks the wire contract:
//! form fields on send, query parameters on receive, and how HTTP and API
//! failures map onto `TransportError`.

mod common;

use std::sync::Arc;

use common::{ctx_a, ctx_b, secret, Call, RecordingHandler, DEVICE_A, DEVICE_B};
use kex_protocol::{
    Body, HttpRelayClient, KexError, MessageKind, ReceiveRequest, Receiver, RelayClient,
    RelayConfig, RelayMessage, Sender, TransportError,
};
use serde_json::json;
use shared_types::Kid;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// TEST HELPERS
// =============================================================================

fn client(server: &MockServer, token: Option<&str>) -> Arc<HttpRelayClient> {
    let config = RelayConfig {
        base_url: format!("{}/", server.uri()),
        session_token: token.map(str::to_string),
        request_timeout_secs: 5,
    };
    Arc::new(HttpRelayClient::new(&config))
}

fn ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "status": { "code": 0, "desc": "OK" }
    }))
}

/// Decodes a form-encoded request body into key/value pairs.
fn form_pairs(body: &[u8]) -> Vec<(String, String)> {
    let url = reqwest::Url::parse(&format!(
        "http://form.invalid/?{}",
        String::from_utf8_lossy(body)
    ))
    .unwrap();
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

// =============================================================================
// SEND
// =============================================================================

#[tokio::test]
async fn test_send_posts_documented_form_fields() {
    let server = MockServer::start().await;
    let secret = secret();

    Mock::given(method("POST"))
        .and(path("/kex/send"))
        .and(header("authorization", "Bearer session-token"))
        .and(body_string_contains("dir=1"))
        .and(body_string_contains(format!("I={}", secret.strong_id().to_hex())))
        .and(body_string_contains(format!("w={}", secret.weak_id().to_hex())))
        .and(body_string_contains(format!("sender={}", DEVICE_A.to_hex())))
        .and(body_string_contains(format!("receiver={}", DEVICE_B.to_hex())))
        .and(body_string_contains("seqno=0"))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    Sender::new(client(&server, Some("session-token")))
        .hello(&ctx_a(&secret), DEVICE_A, Kid(vec![0x01, 0x20]))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let pairs = form_pairs(&requests[0].body);
    let msg = pairs
        .iter()
        .find(|(k, _)| k == "msg")
        .map(|(_, v)| v.clone())
        .unwrap();
    let body = Body::decode(&msg).unwrap();
    assert_eq!(body.kind(), MessageKind::Hello);
    assert!(body.mac.is_some());
}

#[tokio::test]
async fn test_send_http_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kex/send"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = Sender::new(client(&server, None))
        .start_reverse_kex_session(&ctx_a(&secret()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        KexError::Transport(TransportError::Status { code: 500 })
    ));
}

#[tokio::test]
async fn test_send_api_error_maps_to_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/kex/send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": { "code": 218, "desc": "bad session" }
        })))
        .mount(&server)
        .await;

    let err = Sender::new(client(&server, None))
        .start_reverse_kex_session(&ctx_a(&secret()))
        .await
        .unwrap_err();
    match err {
        KexError::Transport(TransportError::Api { code, desc }) => {
            assert_eq!(code, 218);
            assert_eq!(desc, "bad session");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

// =============================================================================
// RECEIVE
// =============================================================================

#[tokio::test]
async fn test_receive_sends_query_and_dispatches_messages() {
    let server = MockServer::start().await;
    let secret = secret();

    // Capture what the sender would post, then serve it back from the relay.
    Mock::given(method("POST"))
        .and(path("/kex/send"))
        .respond_with(ok())
        .mount(&server)
        .await;
    let relay = client(&server, None);
    Sender::new(relay.clone())
        .start_kex_session(&ctx_a(&secret), secret.strong_id())
        .await
        .unwrap();
    let sent = form_pairs(&server.received_requests().await.unwrap()[0].body);
    let field = |name: &str| {
        sent.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap()
    };

    let stored = RelayMessage {
        uid: common::UID.to_hex(),
        sender: field("sender"),
        receiver: field("receiver"),
        seqno: field("seqno").parse().unwrap(),
        dir: field("dir").parse().unwrap(),
        strong_id_hex: field("I"),
        weak_id_hex: field("w"),
        msg: field("msg"),
    };

    Mock::given(method("GET"))
        .and(path("/kex/receive"))
        .and(query_param("w", secret.weak_id().to_hex()))
        .and(query_param("dir", "1"))
        .and(query_param("low", "0"))
        .and(query_param("poll", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": { "code": 0, "desc": "OK" },
            "msgs": [stored],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let handler = Arc::new(RecordingHandler::default());
    let mut receiver = Receiver::new(relay, handler.clone());
    let kinds = receiver.receive(&ctx_b(&secret)).await.unwrap();

    assert_eq!(kinds, vec![MessageKind::StartKex]);
    assert_eq!(handler.calls(), vec![Call::StartKex(secret.strong_id())]);
}

#[tokio::test]
async fn test_receive_empty_poll() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/kex/receive"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": { "code": 0, "desc": "OK" },
            "msgs": [],
        })))
        .mount(&server)
        .await;

    let batch = client(&server, None)
        .receive(ReceiveRequest {
            weak_id_hex: "00".repeat(16),
            direction: 2,
            low_watermark: 4,
            poll_seconds: 1,
        })
        .await
        .unwrap();
    assert!(batch.is_empty());
}

#[tokio::test]
async fn test_receive_garbage_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/kex/receive"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server, None)
        .receive(ReceiveRequest {
            weak_id_hex: "00".repeat(16),
            direction: 1,
            low_watermark: 0,
            poll_seconds: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidResponse(_)));
}
