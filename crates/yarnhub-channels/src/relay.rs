use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::RelayError;
use crate::wire::WebhookRequest;

/// Turns a user's text into the assistant's reply.
///
/// Adapters depend on this rather than on HTTP so their message handling
/// can be exercised without a running gateway.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn ask(&self, message: &str) -> Result<String, RelayError>;
}

#[async_trait]
impl<T: Relay + ?Sized> Relay for std::sync::Arc<T> {
    async fn ask(&self, message: &str) -> Result<String, RelayError> {
        (**self).ask(message).await
    }
}

/// HTTP client for the gateway's `POST /webhook` endpoint.
#[derive(Clone)]
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Relay for WebhookClient {
    async fn ask(&self, message: &str) -> Result<String, RelayError> {
        debug!(url = %self.url, len = message.len(), "forwarding message to webhook");

        let resp = self
            .client
            .post(&self.url)
            .json(&WebhookRequest {
                message: message.to_string(),
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "webhook returned an error");
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ReplyBody = resp
            .json()
            .await
            .map_err(|e| RelayError::Decode(e.to_string()))?;
        body.reply.ok_or(RelayError::MissingReply)
    }
}

#[derive(Deserialize)]
struct ReplyBody {
    reply: Option<String>,
}
