use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info};

use yarnhub_channels::Relay;

use crate::client::CommentApi;
use crate::error::YouTubeError;

/// What a single poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The video has no comments yet.
    NoComments,
    /// The newest comment is the one answered last time.
    AlreadyAnswered,
    /// A reply was posted under the comment with this id.
    Replied(String),
}

/// Polls one video and answers its newest comment once.
///
/// Only the most recently answered comment id is remembered, and only in
/// memory; a restart may answer the newest comment again.
pub struct CommentWatcher<A, R> {
    api: A,
    relay: R,
    interval: Duration,
    last_seen: Option<String>,
}

impl<A: CommentApi, R: Relay> CommentWatcher<A, R> {
    pub fn new(api: A, relay: R, interval: Duration) -> Self {
        Self {
            api,
            relay,
            interval,
            last_seen: None,
        }
    }

    /// Id of the last comment a reply was posted for.
    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// Fetch the newest comment and answer it if it is new.
    ///
    /// The marker only moves after the reply is posted, so any failure
    /// leaves the comment to be retried on the next poll.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, YouTubeError> {
        let Some(comment) = self.api.latest_comment().await? else {
            info!("no comments found on this video");
            return Ok(PollOutcome::NoComments);
        };

        if self.last_seen.as_deref() == Some(comment.id.as_str()) {
            return Ok(PollOutcome::AlreadyAnswered);
        }

        info!(
            comment_id = %comment.id,
            author = %comment.author,
            published_at = ?comment.published_at,
            "new comment: {}",
            comment.text
        );

        let reply = self.relay.ask(&comment.text).await?;
        info!(comment_id = %comment.id, "reply: {}", reply);

        self.api.post_reply(&comment.id, &reply).await?;
        info!(comment_id = %comment.id, "reply posted to YouTube");

        self.last_seen = Some(comment.id.clone());
        Ok(PollOutcome::Replied(comment.id))
    }

    /// Poll until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// Each poll runs to completion before the next delay starts.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(every_secs = self.interval.as_secs(), "comment watcher started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            if let Err(e) = self.poll_once().await {
                error!(error = %e, "comment poll failed");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("comment watcher stopped");
    }
}
