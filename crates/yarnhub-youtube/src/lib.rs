//! `yarnhub-youtube` — answers the newest comment on a YouTube video through
//! the webhook and posts the reply as a threaded response.

pub mod client;
pub mod error;
pub mod types;
pub mod watcher;

pub use client::{CommentApi, YouTubeClient};
pub use error::YouTubeError;
pub use types::Comment;
pub use watcher::{CommentWatcher, PollOutcome};
