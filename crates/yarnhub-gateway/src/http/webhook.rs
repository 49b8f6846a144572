//! Message relay endpoint — POST /webhook.
//!
//! Request:  `{"message": "..."}`
//! Response: `{"reply": "..."}`
//! Errors:   `400 {"error": "No message provided"}`,
//!           `500 {"error": "Internal Server Error"}`
//!
//! Every adapter (Discord bot, YouTube watcher, web widgets) goes through
//! this one contract. Backend failures are logged here and never leaked to
//! the caller.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};
use yarnhub_channels::{WebhookError, WebhookReply};
use yarnhub_core::YarnhubError;

use crate::app::AppState;

/// POST /webhook
pub async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WebhookReply>, (StatusCode, Json<WebhookError>)> {
    let request_id = uuid::Uuid::new_v4();

    let message = extract_message(&body).map_err(|e| {
        warn!(%request_id, reason = %e, "rejecting webhook request");
        (StatusCode::BAD_REQUEST, Json(WebhookError::no_message()))
    })?;

    info!(%request_id, len = message.len(), "webhook message received");

    match state.waiter.get_reply(&message).await {
        Ok(reply) => {
            info!(%request_id, len = reply.len(), "reply ready");
            Ok(Json(WebhookReply { reply }))
        }
        Err(e) => {
            error!(%request_id, error = %e, "assistant backend failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookError::internal()),
            ))
        }
    }
}

/// Pull a non-empty string `message` out of a JSON object body.
///
/// Whitespace-only text is still a message and is forwarded as-is.
fn extract_message(body: &[u8]) -> Result<String, YarnhubError> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| YarnhubError::Validation(format!("invalid JSON body: {e}")))?;

    let message = match payload.get("message") {
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(YarnhubError::Validation(
                "message is not a string".to_string(),
            ))
        }
        None => return Err(YarnhubError::Validation("message is missing".to_string())),
    };

    if message.is_empty() {
        return Err(YarnhubError::Validation("message is empty".to_string()));
    }

    Ok(message.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{build_router, AppState};
    use axum::{body::Body, http::Request, Router};
    use std::time::Duration;
    use tower::ServiceExt;
    use yarnhub_assistant::{CompletionWaiter, FailAt, InMemoryBackend, PollPolicy};
    use yarnhub_core::config::{GatewayConfig, DEFAULT_FALLBACK_REPLY};

    fn app(backend: InMemoryBackend) -> Router {
        let waiter = CompletionWaiter::new(Arc::new(backend), "asst_test").with_policy(PollPolicy {
            interval: Duration::from_millis(1),
            max_wait: Some(Duration::from_secs(5)),
        });
        build_router(Arc::new(AppState::new(GatewayConfig::default(), waiter)))
    }

    async fn post_webhook(app: Router, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn valid_message_returns_normalized_reply() {
        let backend =
            InMemoryBackend::new().with_reply("Use bamboo needles [2] :source: .".to_string());

        let (status, body) = post_webhook(app(backend), r#"{"message":"best needles?"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"reply": "Use bamboo needles."}));
    }

    #[tokio::test]
    async fn missing_message_is_bad_request() {
        let (status, body) = post_webhook(app(InMemoryBackend::new()), r#"{"text":"hi"}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({"error": "No message provided"}));
    }

    #[tokio::test]
    async fn empty_or_null_message_is_bad_request() {
        for body in [r#"{"message":""}"#, r#"{"message":null}"#] {
            let (status, _) = post_webhook(app(InMemoryBackend::new()), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        }
    }

    #[tokio::test]
    async fn whitespace_only_message_is_forwarded() {
        let backend = Arc::new(InMemoryBackend::new().with_reply("Ask away!".to_string()));
        let waiter = CompletionWaiter::new(backend.clone(), "asst_test").with_policy(PollPolicy {
            interval: Duration::from_millis(1),
            max_wait: Some(Duration::from_secs(5)),
        });
        let app = build_router(Arc::new(AppState::new(GatewayConfig::default(), waiter)));

        let (status, body) = post_webhook(app, r#"{"message":"   "}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Ask away!");
        assert_eq!(backend.user_messages(), vec!["   ".to_string()]);
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = post_webhook(app(InMemoryBackend::new()), "message=hi").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No message provided");
    }

    #[tokio::test]
    async fn backend_failure_is_opaque_server_error() {
        let backend = InMemoryBackend::new().failing_at(FailAt::CreateRun);

        let (status, body) = post_webhook(app(backend), r#"{"message":"hello"}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "Internal Server Error"}));
    }

    #[tokio::test]
    async fn thread_without_reply_returns_fallback_with_ok() {
        let backend = InMemoryBackend::new().without_reply();

        let (status, body) = post_webhook(app(backend), r#"{"message":"hello"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], DEFAULT_FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn get_is_not_allowed() {
        let resp = app(InMemoryBackend::new())
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/webhook")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_origin() {
        let resp = app(InMemoryBackend::new())
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/webhook")
                    .header("origin", "https://shop.example")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[tokio::test]
    async fn health_reports_backend() {
        let resp = app(InMemoryBackend::new())
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend"], "in-memory");
    }

    #[test]
    fn extract_message_rejects_non_string() {
        let err = extract_message(br#"{"message": 42}"#).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(extract_message(br#"{"message":"hi"}"#).unwrap(), "hi");
        assert_eq!(extract_message(br#"{"message":" \t"}"#).unwrap(), " \t");
    }
}
