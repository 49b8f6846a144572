use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serenity::model::gateway::GatewayIntents;
use serenity::Client;
use tracing::{error, info, warn};

use yarnhub_channels::Relay;
use yarnhub_core::config::DiscordConfig;

use crate::error::DiscordError;
use crate::handler::DiscordHandler;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Discord channel adapter.
///
/// Wraps a serenity `Client` and keeps it connected; every accepted message
/// is answered through the configured [`Relay`].
pub struct DiscordAdapter {
    relay: Arc<dyn Relay>,
    config: DiscordConfig,
    token: String,
}

impl DiscordAdapter {
    pub fn new(config: &DiscordConfig, relay: Arc<dyn Relay>) -> Result<Self, DiscordError> {
        let token = config
            .bot_token()
            .map_err(|_| DiscordError::NoToken)?
            .to_string();
        Ok(Self {
            relay,
            config: config.clone(),
            token,
        })
    }

    /// Connect to Discord and reconnect whenever the gateway drops.
    ///
    /// Never returns; callers stop it by dropping the future.
    pub async fn run(self) {
        let intents = GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT;

        loop {
            let mut client = match self.build_client(intents).await {
                Ok(c) => c,
                Err(e) => {
                    error!("Discord: connect failed ({e}), retrying in 30s");
                    tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                    continue;
                }
            };

            info!("Discord: gateway connecting");
            match client.start().await {
                Err(e) => warn!("Discord: gateway error ({e}), reconnecting in 5s"),
                Ok(()) => info!("Discord: gateway stopped, reconnecting in 5s"),
            }

            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn build_client(&self, intents: GatewayIntents) -> Result<Client, DiscordError> {
        let handler = DiscordHandler {
            relay: Arc::clone(&self.relay),
            config: self.config.clone(),
            bot_id: OnceLock::new(),
        };

        let client = Client::builder(&self.token, intents)
            .event_handler(handler)
            .await?;
        Ok(client)
    }
}
