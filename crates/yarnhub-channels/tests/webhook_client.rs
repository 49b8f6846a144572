use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use yarnhub_channels::{Relay, RelayError, WebhookClient};

fn client(server: &MockServer) -> WebhookClient {
    WebhookClient::new(server.url("/webhook"), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn ask_posts_message_and_returns_reply() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/webhook")
            .json_body(json!({"message": "which needles for chunky yarn?"}));
        then.status(200).json_body(json!({"reply": "Try 10mm needles."}));
    });

    let reply = client(&server)
        .ask("which needles for chunky yarn?")
        .await
        .unwrap();

    mock.assert();
    assert_eq!(reply, "Try 10mm needles.");
}

#[tokio::test]
async fn server_error_is_reported_with_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/webhook");
        then.status(500)
            .json_body(json!({"error": "Internal Server Error"}));
    });

    let err = client(&server).ask("hi").await.unwrap_err();

    assert!(matches!(err, RelayError::Status { status: 500, .. }));
}

#[tokio::test]
async fn success_without_reply_field_is_missing_reply() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/webhook");
        then.status(200).json_body(json!({}));
    });

    let err = client(&server).ask("hi").await.unwrap_err();

    assert!(matches!(err, RelayError::MissingReply));
}

#[tokio::test]
async fn unreachable_webhook_is_a_transport_error() {
    // Nothing listens on port 9 (discard) in the test environment.
    let client = WebhookClient::new("http://127.0.0.1:9/webhook", Duration::from_secs(2)).unwrap();

    let err = client.ask("hi").await.unwrap_err();

    assert!(matches!(err, RelayError::Unreachable(_)));
}
