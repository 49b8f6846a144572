use std::sync::{Arc, OnceLock};

use serenity::async_trait;
use serenity::builder::EditMessage;
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::id::{ChannelId, UserId};
use serenity::prelude::{Context, EventHandler};
use tracing::{info, warn};

use yarnhub_channels::{Relay, RelayError};
use yarnhub_core::config::DiscordConfig;

use crate::send;

pub const BRAIN_SLOW: &str = "⚠️ Brain is slow, try again later.";
pub const BRAIN_UNREACHABLE: &str = "❌ Could not reach brain.";
pub const NO_REPLY: &str = "Sorry, no reply.";

/// Serenity event handler that forwards channel messages to the webhook.
pub struct DiscordHandler {
    pub relay: Arc<dyn Relay>,
    pub config: DiscordConfig,
    pub bot_id: OnceLock<UserId>,
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.bot_id.set(ready.user.id).ok();
        info!(name = %ready.user.name, id = %ready.user.id, "Discord bot connected");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if msg.guild_id.is_some() && self.config.require_mention {
            let Some(bot_id) = self.bot_id.get() else {
                return;
            };
            if !msg.mentions_user_id(*bot_id) {
                return;
            }
        }

        let content = strip_mention(&msg.content).trim().to_string();
        if content.is_empty() {
            return;
        }

        info!(channel = %msg.channel_id, author = %msg.author.name, "message received");

        let placeholder = match msg.channel_id.say(&ctx.http, &self.config.thinking_text).await {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "failed to post placeholder");
                return;
            }
        };

        let relay = Arc::clone(&self.relay);
        let http = Arc::clone(&ctx.http);
        let channel_id = msg.channel_id;
        tokio::spawn(async move {
            let answer = reply_text(relay.ask(&content).await);
            if let Err(e) = deliver(&http, channel_id, placeholder, &answer).await {
                warn!(error = %e, "failed to deliver reply");
            }
        });
    }
}

/// Text shown to the user for the outcome of a relay call.
pub fn reply_text(result: Result<String, RelayError>) -> String {
    match result {
        Ok(reply) => reply,
        Err(RelayError::MissingReply) => NO_REPLY.to_string(),
        Err(e @ RelayError::Status { .. }) => {
            warn!(error = %e, "webhook rejected message");
            BRAIN_SLOW.to_string()
        }
        Err(e) => {
            warn!(error = %e, "webhook call failed");
            BRAIN_UNREACHABLE.to_string()
        }
    }
}

/// Replace the placeholder with the first chunk; post the rest as follow-ups.
async fn deliver(
    http: &Http,
    channel_id: ChannelId,
    mut placeholder: Message,
    text: &str,
) -> Result<(), serenity::Error> {
    let mut chunks = send::split_chunks(text).into_iter();
    if let Some(first) = chunks.next() {
        placeholder
            .edit(http, EditMessage::new().content(first))
            .await?;
    }
    for chunk in chunks {
        channel_id.say(http, chunk).await?;
    }
    Ok(())
}

/// Remove an @mention prefix (e.g. `<@123456789>`) from a message.
fn strip_mention(s: &str) -> &str {
    let trimmed = s.trim_start();
    if trimmed.starts_with("<@") {
        if let Some(end) = trimmed.find('>') {
            return trimmed[end + 1..].trim_start();
        }
    }
    trimmed
}
