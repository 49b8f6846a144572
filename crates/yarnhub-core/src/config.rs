use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, YarnhubError};

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const WEBHOOK_PATH: &str = "/webhook";
pub const DEFAULT_CONFIG_FILE: &str = "yarnhub.toml";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_FALLBACK_REPLY: &str = "Sorry, I couldn\u{2019}t generate a response this time.";

/// Plain environment variables used by earlier deployments, mapped onto
/// their nested config key. `YARNHUB_*` overrides take precedence.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("ASSISTANT_ID", "assistant.assistant_id"),
    ("OPENAI_API_KEY", "assistant.api_key"),
    ("DISCORD_BOT_TOKEN", "channels.discord.bot_token"),
    ("YOUTUBE_API_KEY", "channels.youtube.api_key"),
    ("PORT", "gateway.port"),
];

/// Top-level config (yarnhub.toml + legacy env + YARNHUB_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YarnhubConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow cross-origin requests from any origin.
    #[serde(default = "bool_true")]
    pub cors_allow_any: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            cors_allow_any: true,
        }
    }
}

/// Hosted assistant backend (OpenAI Assistants API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub assistant_id: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Delay between run status checks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up on a run after this long. Unset means wait for as long as
    /// the backend keeps reporting the run as active.
    pub max_wait_secs: Option<u64>,
    /// Timeout applied to each individual HTTP call to the backend.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Returned when the backend finishes without any assistant text.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            assistant_id: None,
            api_key: None,
            base_url: default_openai_base_url(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_wait_secs: None,
            request_timeout_secs: default_request_timeout_secs(),
            fallback_reply: default_fallback_reply(),
        }
    }
}

impl AssistantConfig {
    pub fn assistant_id(&self) -> Result<&str> {
        require(&self.assistant_id, "assistant.assistant_id (ASSISTANT_ID)")
    }

    pub fn api_key(&self) -> Result<&str> {
        require(&self.api_key, "assistant.api_key (OPENAI_API_KEY)")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: Option<String>,
    /// Gateway endpoint that turns a message into a reply.
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,
    /// When true, guild messages are only processed when the bot is @mentioned.
    #[serde(default)]
    pub require_mention: bool,
    /// Placeholder posted while the reply is being generated.
    #[serde(default = "default_thinking_text")]
    pub thinking_text: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            webhook_url: default_webhook_url(),
            require_mention: false,
            thinking_text: default_thinking_text(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl DiscordConfig {
    pub fn bot_token(&self) -> Result<&str> {
        require(&self.bot_token, "channels.discord.bot_token (DISCORD_BOT_TOKEN)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    pub api_key: Option<String>,
    /// OAuth access token; required by YouTube for posting comment replies.
    pub access_token: Option<String>,
    pub video_id: Option<String>,
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,
    #[serde(default = "default_youtube_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_youtube_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            access_token: None,
            video_id: None,
            webhook_url: default_webhook_url(),
            api_base_url: default_youtube_api_base_url(),
            poll_interval_secs: default_youtube_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl YouTubeConfig {
    pub fn api_key(&self) -> Result<&str> {
        require(&self.api_key, "channels.youtube.api_key (YOUTUBE_API_KEY)")
    }

    pub fn video_id(&self) -> Result<&str> {
        require(&self.video_id, "channels.youtube.video_id")
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(YarnhubError::Config(format!("missing required setting {name}"))),
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_fallback_reply() -> String {
    DEFAULT_FALLBACK_REPLY.to_string()
}
fn default_webhook_url() -> String {
    format!("http://{}:{}{}", DEFAULT_BIND, DEFAULT_PORT, WEBHOOK_PATH)
}
fn default_thinking_text() -> String {
    "\u{1f916} Thinking...".to_string()
}
fn default_youtube_api_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}
fn default_youtube_poll_interval_secs() -> u64 {
    30
}

impl YarnhubConfig {
    /// Load config from a TOML file with environment overrides.
    ///
    /// File lookup order:
    ///   1. Explicit path argument
    ///   2. `YARNHUB_CONFIG` env var
    ///   3. `./yarnhub.toml`
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("YARNHUB_CONFIG").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        tracing::debug!(path = %path, "loading config");

        Self::figment(&path)
            .extract()
            .map_err(|e| YarnhubError::Config(e.to_string()))
    }

    /// Provider stack, lowest precedence first.
    pub fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(legacy_env())
            .merge(Env::prefixed("YARNHUB_").split("__"))
    }
}

fn legacy_env() -> Env {
    Env::raw()
        .only(&["ASSISTANT_ID", "OPENAI_API_KEY", "DISCORD_BOT_TOKEN", "YOUTUBE_API_KEY", "PORT"])
        .map(|key| {
            LEGACY_ENV
                .iter()
                .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                .map(|(_, nested)| (*nested).into())
                .unwrap_or_else(|| key.into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn empty_environment_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = YarnhubConfig::load(Some("missing.toml")).expect("defaults load");
            assert_eq!(config.gateway.port, DEFAULT_PORT);
            assert_eq!(config.gateway.bind, DEFAULT_BIND);
            assert_eq!(config.assistant.poll_interval_ms, 500);
            assert!(config.assistant.max_wait_secs.is_none());
            assert_eq!(config.channels.youtube.poll_interval_secs, 30);
            assert_eq!(
                config.channels.discord.webhook_url,
                "http://127.0.0.1:5001/webhook"
            );
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_read() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "yarnhub.toml",
                r#"
                [gateway]
                port = 8080

                [assistant]
                assistant_id = "asst_toml"
                max_wait_secs = 120

                [channels.youtube]
                video_id = "abc123"
                "#,
            )?;
            let config = YarnhubConfig::load(None).expect("config");
            assert_eq!(config.gateway.port, 8080);
            assert_eq!(config.assistant.assistant_id().unwrap(), "asst_toml");
            assert_eq!(config.assistant.max_wait_secs, Some(120));
            assert_eq!(config.channels.youtube.video_id().unwrap(), "abc123");
            Ok(())
        });
    }

    #[test]
    fn legacy_env_vars_fill_nested_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("ASSISTANT_ID", "asst_env");
            jail.set_env("OPENAI_API_KEY", "sk-test");
            jail.set_env("DISCORD_BOT_TOKEN", "discord-token");
            jail.set_env("PORT", "9000");
            let config = YarnhubConfig::load(None).expect("config");
            assert_eq!(config.assistant.assistant_id().unwrap(), "asst_env");
            assert_eq!(config.assistant.api_key().unwrap(), "sk-test");
            assert_eq!(config.channels.discord.bot_token().unwrap(), "discord-token");
            assert_eq!(config.gateway.port, 9000);
            Ok(())
        });
    }

    #[test]
    fn prefixed_env_overrides_legacy_and_file() {
        Jail::expect_with(|jail| {
            jail.create_file("yarnhub.toml", "[assistant]\nassistant_id = \"from_file\"\n")?;
            jail.set_env("ASSISTANT_ID", "from_legacy");
            jail.set_env("YARNHUB_ASSISTANT__ASSISTANT_ID", "from_prefixed");
            jail.set_env("YARNHUB_GATEWAY__CORS_ALLOW_ANY", "false");
            let config = YarnhubConfig::load(None).expect("config");
            assert_eq!(config.assistant.assistant_id().unwrap(), "from_prefixed");
            assert!(!config.gateway.cors_allow_any);
            Ok(())
        });
    }

    #[test]
    fn invalid_value_fails_load_and_names_the_key() {
        Jail::expect_with(|jail| {
            jail.set_env("ASSISTANT_ID", "asst_env");
            jail.set_env("PORT", "not-a-port");
            let err = YarnhubConfig::load(None).unwrap_err();
            assert_eq!(err.code(), "CONFIG_ERROR");
            assert!(err.to_string().contains("port"), "{err}");
            Ok(())
        });
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let config = YarnhubConfig::default();
        let err = config.assistant.api_key().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        let mut blank = AssistantConfig::default();
        blank.assistant_id = Some("   ".to_string());
        assert!(blank.assistant_id().is_err());
    }
}
