use std::env;

use log::{debug, error, info};
use serde::Deserialize;
use strum::Display;

use crate::error::{BotError, Result};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_THREAD_HISTORY_LIMIT: u32 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub slack_signing_secret: String,
    pub slack_bot_token: String,
    pub slack_bot_member_id: String,
    pub backend: BackendConfig,
    pub system_prompt: Option<String>,
    pub bind_address: String,
    pub thread_history_limit: u32,
}

/// Settings for the OpenAI-compatible chat completion backend (`CHATGPT_SETTINGS`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatGptSettings {
    pub api_key: String,
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Settings for the Bedrock backend (`BEDROCK_SETTINGS`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockSettings {
    pub model: String,
    #[serde(default, alias = "kb")]
    pub knowledge_base_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Which generation pathway handles a mention. Exactly one is configured.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum BackendConfig {
    #[strum(serialize = "direct-chat")]
    DirectChat(ChatGptSettings),
    #[strum(serialize = "retrieval-augmented")]
    RetrievalAugmented(BedrockSettings),
}

impl BackendConfig {
    /// Validate the raw provider settings blobs into a single backend choice.
    ///
    /// Blank values and the literal `null` count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`BotError::Config`] when neither or both blocks are present,
    /// and [`BotError::Settings`] when the present block is not valid JSON.
    pub fn from_settings(chatgpt: Option<&str>, bedrock: Option<&str>) -> Result<Self> {
        match (present(chatgpt), present(bedrock)) {
            (Some(_), Some(_)) => Err(BotError::Config(
                "both CHATGPT_SETTINGS and BEDROCK_SETTINGS are set; configure exactly one"
                    .to_string(),
            )),
            (None, None) => Err(BotError::Config(
                "no model settings: set CHATGPT_SETTINGS or BEDROCK_SETTINGS".to_string(),
            )),
            (Some(raw), None) => {
                let settings: ChatGptSettings =
                    serde_json::from_str(raw).map_err(|source| BotError::Settings {
                        name: "CHATGPT_SETTINGS",
                        source,
                    })?;
                require_non_empty("CHATGPT_SETTINGS.apiKey", &settings.api_key)?;
                require_non_empty("CHATGPT_SETTINGS.model", &settings.model)?;
                Ok(BackendConfig::DirectChat(settings))
            }
            (None, Some(raw)) => {
                let mut settings: BedrockSettings =
                    serde_json::from_str(raw).map_err(|source| BotError::Settings {
                        name: "BEDROCK_SETTINGS",
                        source,
                    })?;
                require_non_empty("BEDROCK_SETTINGS.model", &settings.model)?;
                settings.knowledge_base_id = settings
                    .knowledge_base_id
                    .filter(|id| !id.trim().is_empty());
                Ok(BackendConfig::RetrievalAugmented(settings))
            }
        }
    }

    /// Provider name used in log lines.
    #[must_use]
    pub fn provider(&self) -> &'static str {
        match self {
            BackendConfig::DirectChat(_) => "openai",
            BackendConfig::RetrievalAugmented(_) => "bedrock",
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            BackendConfig::DirectChat(settings) => &settings.model,
            BackendConfig::RetrievalAugmented(settings) => &settings.model,
        }
    }
}

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty() && *value != "null")
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BotError::Config(format!("{name} must not be empty")));
    }
    Ok(())
}

fn required_var(name: &'static str) -> Result<String> {
    env::var(name).map_err(|source| {
        error!("Failed to load {name} from environment: {source}");
        BotError::EnvVar { name, source }
    })
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    /// Load configuration from the environment (and a `.env` file, if present).
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, the backend
    /// settings are missing or ambiguous, or a numeric option does not parse.
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        let slack_signing_secret = required_var("SLACK_SIGNING_SECRET")?;
        let slack_bot_token = required_var("SLACK_BOT_TOKEN")?;
        let slack_bot_member_id = required_var("SLACK_BOT_MEMBER_ID")?;

        let backend = BackendConfig::from_settings(
            optional_var("CHATGPT_SETTINGS").as_deref(),
            optional_var("BEDROCK_SETTINGS").as_deref(),
        )
        .inspect_err(|e| error!("Invalid backend configuration: {e}"))?;

        let system_prompt = optional_var("SYSTEM_PROMPT");
        let bind_address =
            optional_var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());
        let thread_history_limit = match optional_var("THREAD_HISTORY_LIMIT") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                BotError::Config(format!("THREAD_HISTORY_LIMIT must be a number: {e}"))
            })?,
            None => DEFAULT_THREAD_HISTORY_LIMIT,
        };

        info!("Configuration loaded successfully");
        debug!(
            "Slack signing secret length: {} characters",
            slack_signing_secret.len()
        );
        debug!("Slack bot token length: {} characters", slack_bot_token.len());
        debug!("Slack bot member id: {slack_bot_member_id}");
        debug!(
            "Backend: {} (provider: {}, model: {})",
            backend,
            backend.provider(),
            backend.model()
        );
        debug!("Thread history limit: {thread_history_limit}");

        Ok(Self {
            slack_signing_secret,
            slack_bot_token,
            slack_bot_member_id,
            backend,
            system_prompt,
            bind_address,
            thread_history_limit,
        })
    }
}
