use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use yarnhub_core::config::AssistantConfig;

use crate::backend::{AssistantBackend, BackendError};
use crate::types::{Role, Run, RunId, ThreadId, ThreadMessage};

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// OpenAI Assistants API (v2) over HTTP.
pub struct OpenAiAssistants {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiAssistants {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url
            .unwrap_or_else(|| "https://api.openai.com".to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    pub fn from_config(config: &AssistantConfig) -> Result<Self, BackendError> {
        let api_key = config
            .api_key()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Self::new(
            api_key.to_string(),
            Some(config.base_url.clone()),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, BackendError> {
        debug!(path, "POST to OpenAI assistants");
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .json(body)
            .send()
            .await?;
        decode(resp).await
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, BackendError> {
        debug!(path, "GET from OpenAI assistants");
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .query(query)
            .send()
            .await?;
        decode(resp).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %text, "OpenAI assistants API error");
        return Err(BackendError::Api {
            status: status.as_u16(),
            message: text,
        });
    }

    resp.json()
        .await
        .map_err(|e| BackendError::Parse(e.to_string()))
}

#[async_trait]
impl AssistantBackend for OpenAiAssistants {
    fn name(&self) -> &str {
        "openai"
    }

    async fn create_thread(&self) -> Result<ThreadId, BackendError> {
        let thread: ObjectRef = self.post("/threads", &serde_json::json!({})).await?;
        Ok(ThreadId(thread.id))
    }

    async fn add_message(
        &self,
        thread_id: &ThreadId,
        role: Role,
        content: &str,
    ) -> Result<(), BackendError> {
        let body = serde_json::json!({
            "role": role,
            "content": content,
        });
        let _: ObjectRef = self
            .post(&format!("/threads/{thread_id}/messages"), &body)
            .await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &ThreadId,
        assistant_id: &str,
    ) -> Result<Run, BackendError> {
        let body = serde_json::json!({ "assistant_id": assistant_id });
        self.post(&format!("/threads/{thread_id}/runs"), &body).await
    }

    async fn get_run(&self, thread_id: &ThreadId, run_id: &RunId) -> Result<Run, BackendError> {
        self.get(&format!("/threads/{thread_id}/runs/{run_id}"), &[])
            .await
    }

    async fn list_messages(&self, thread_id: &ThreadId) -> Result<Vec<ThreadMessage>, BackendError> {
        let list: MessageList = self
            .get(&format!("/threads/{thread_id}/messages"), &[("order", "desc")])
            .await?;
        Ok(list.data)
    }
}

// Wire types (private — deserialization only)

#[derive(Deserialize)]
struct ObjectRef {
    id: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}
