use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use yarnhub_core::config::YouTubeConfig;

use crate::error::YouTubeError;
use crate::types::{Comment, ThreadList};

/// The two YouTube Data API calls the watcher needs.
#[async_trait]
pub trait CommentApi: Send + Sync {
    /// Newest top-level comment on the watched video, if any.
    async fn latest_comment(&self) -> Result<Option<Comment>, YouTubeError>;

    /// Post `text` as a reply under the comment thread `parent_id`.
    async fn post_reply(&self, parent_id: &str, text: &str) -> Result<(), YouTubeError>;
}

#[async_trait]
impl<T: CommentApi + ?Sized> CommentApi for std::sync::Arc<T> {
    async fn latest_comment(&self) -> Result<Option<Comment>, YouTubeError> {
        (**self).latest_comment().await
    }

    async fn post_reply(&self, parent_id: &str, text: &str) -> Result<(), YouTubeError> {
        (**self).post_reply(parent_id, text).await
    }
}

/// YouTube Data API v3 client bound to one video.
pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    video_id: String,
}

impl YouTubeClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        video_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, YouTubeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
            video_id: video_id.into(),
        })
    }

    /// Send `token` as a bearer credential; YouTube requires OAuth for inserts.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn from_config(config: &YouTubeConfig) -> Result<Self, YouTubeError> {
        let api_key = config
            .api_key()
            .map_err(|e| YouTubeError::Config(e.to_string()))?;
        let video_id = config
            .video_id()
            .map_err(|e| YouTubeError::Config(e.to_string()))?;

        let client = Self::new(
            config.api_base_url.as_str(),
            api_key,
            video_id,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(match config.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => client.with_access_token(token),
            _ => client,
        })
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, YouTubeError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %text, "YouTube API error");
        return Err(YouTubeError::Api {
            status: status.as_u16(),
            message: text,
        });
    }

    resp.json()
        .await
        .map_err(|e| YouTubeError::Parse(e.to_string()))
}

#[async_trait]
impl CommentApi for YouTubeClient {
    async fn latest_comment(&self) -> Result<Option<Comment>, YouTubeError> {
        debug!(video_id = %self.video_id, "fetching newest comment");
        let req = self
            .client
            .get(format!("{}/commentThreads", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("videoId", self.video_id.as_str()),
                ("maxResults", "1"),
                ("order", "time"),
                ("key", self.api_key.as_str()),
            ]);
        let list: ThreadList = decode(self.authorize(req).send().await?).await?;
        Ok(list.items.into_iter().next().map(Comment::from))
    }

    async fn post_reply(&self, parent_id: &str, text: &str) -> Result<(), YouTubeError> {
        debug!(parent_id, len = text.len(), "posting comment reply");
        let body = InsertComment {
            snippet: InsertSnippet {
                parent_id,
                text_original: text,
            },
        };
        let req = self
            .client
            .post(format!("{}/comments", self.base_url))
            .query(&[("part", "snippet"), ("key", self.api_key.as_str())])
            .json(&body);
        let _: serde::de::IgnoredAny = decode(self.authorize(req).send().await?).await?;
        Ok(())
    }
}

#[derive(Serialize)]
struct InsertComment<'a> {
    snippet: InsertSnippet<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertSnippet<'a> {
    parent_id: &'a str,
    text_original: &'a str,
}
