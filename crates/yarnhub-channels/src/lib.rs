//! `yarnhub-channels` — the single contract every front-end adapter speaks:
//! `POST /webhook {"message"}` → `{"reply"}`.

pub mod error;
pub mod relay;
pub mod wire;

pub use error::RelayError;
pub use relay::{Relay, WebhookClient};
pub use wire::{WebhookError, WebhookReply, WebhookRequest};
