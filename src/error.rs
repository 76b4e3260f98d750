use reqwest::StatusCode;
use strum::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error ({name}): {source}")]
    EnvVar {
        name: &'static str,
        source: std::env::VarError,
    },

    #[error("Invalid JSON in {name}: {source}")]
    Settings {
        name: &'static str,
        source: serde_json::Error,
    },

    #[error("Nothing to answer: the thread has no pending human message")]
    EmptyRequest,

    #[error("OpenAI API error ({status}): {message}")]
    OpenAiApi { status: StatusCode, message: String },

    #[error("OpenAI response error: {0}")]
    OpenAiResponse(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Bedrock error: {message}")]
    Bedrock { message: String, throttled: bool },

    #[error("{provider} returned an empty reply")]
    EmptyReply { provider: &'static str },

    #[error("Knowledge base retrieval error: {0}")]
    KnowledgeBase(String),

    #[error("Slack API error in {method}: {error}")]
    SlackApi { method: &'static str, error: String },

    #[error("Slack HTTP error in {method}: {source}")]
    SlackHttp {
        method: &'static str,
        source: reqwest::Error,
    },

    #[error("Signature verification failed: {0}")]
    Signature(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure class used for logging and reply policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    InvalidConfiguration,
    EmptyRequest,
    GenerationFailure,
    TranscriptFetchFailure,
    ReplyFailure,
    Transport,
}

impl BotError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Config(_) | BotError::EnvVar { .. } | BotError::Settings { .. } => {
                ErrorKind::InvalidConfiguration
            }
            BotError::EmptyRequest => ErrorKind::EmptyRequest,
            BotError::OpenAiApi { .. }
            | BotError::OpenAiResponse(_)
            | BotError::Reqwest(_)
            | BotError::Bedrock { .. }
            | BotError::EmptyReply { .. }
            | BotError::KnowledgeBase(_) => ErrorKind::GenerationFailure,
            BotError::SlackApi { method, .. } | BotError::SlackHttp { method, .. } => {
                if *method == "chat.postMessage" {
                    ErrorKind::ReplyFailure
                } else {
                    ErrorKind::TranscriptFetchFailure
                }
            }
            BotError::Signature(_) | BotError::Io(_) => ErrorKind::Transport,
        }
    }

    /// Returns a user-friendly error message suitable for posting into the Slack thread
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            BotError::Config(_) | BotError::EnvVar { .. } | BotError::Settings { .. } => {
                "Sorry, there's a configuration issue on my end. Please contact the bot administrator.".to_string()
            }
            BotError::EmptyRequest => {
                "I didn't catch a question there. Mention me together with what you'd like to ask.".to_string()
            }
            BotError::OpenAiApi { status, .. } => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    "Sorry, I'm having authentication issues with my AI service. Please contact the bot administrator.".to_string()
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    "Sorry, I've hit my rate limit. Please try again in a few moments.".to_string()
                }
                status if status.is_server_error() => {
                    "Sorry, the AI service is experiencing issues right now. Please try again later.".to_string()
                }
                _ => {
                    "Sorry, there was an issue with my request to the AI service. Please try again or contact the bot administrator.".to_string()
                }
            },
            BotError::Bedrock { throttled: true, .. } => {
                "Sorry, I've hit my rate limit. Please try again in a few moments.".to_string()
            }
            BotError::OpenAiResponse(_) | BotError::Bedrock { .. } | BotError::EmptyReply { .. } => {
                "Sorry, I received an unexpected response from my AI service. Please try again.".to_string()
            }
            BotError::KnowledgeBase(_) => {
                "Sorry, I couldn't search the knowledge base right now. Please try again later.".to_string()
            }
            BotError::Reqwest(_) => {
                "Sorry, I'm having network issues. Please try again in a moment.".to_string()
            }
            BotError::SlackApi { .. } | BotError::SlackHttp { .. } => {
                "Sorry, I couldn't read this thread. Please try again later.".to_string()
            }
            BotError::Signature(_) | BotError::Io(_) => {
                "Sorry, something went wrong on my end. Please try again later.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
