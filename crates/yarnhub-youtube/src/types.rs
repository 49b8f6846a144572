use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A top-level comment on the watched video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment thread id; replies are posted with this as `parentId`.
    pub id: String,
    pub text: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
}

// Wire types for `commentThreads.list`.

#[derive(Debug, Deserialize)]
pub(crate) struct ThreadList {
    #[serde(default)]
    pub items: Vec<CommentThread>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentThread {
    pub id: String,
    pub snippet: ThreadSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThreadSnippet {
    pub top_level_comment: TopLevelComment,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TopLevelComment {
    pub snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentSnippet {
    #[serde(default)]
    pub text_display: String,
    #[serde(default)]
    pub author_display_name: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<CommentThread> for Comment {
    fn from(thread: CommentThread) -> Self {
        let snippet = thread.snippet.top_level_comment.snippet;
        Self {
            id: thread.id,
            text: snippet.text_display,
            author: snippet.author_display_name,
            published_at: snippet.published_at,
        }
    }
}
