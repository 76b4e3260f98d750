//! Slack Web API client: thread transcripts in, replies out.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::chatbot::ThreadMessage;
use crate::error::{BotError, Result};

const SLACK_API_BASE: &str = "https://slack.com/api";

/// The Slack operations a mention needs.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// Return the root timestamp of the thread containing `ts` (`ts` itself for a root).
    async fn resolve_thread_root(&self, channel: &str, ts: &str) -> Result<String>;

    /// Fetch up to `limit` messages of a thread, oldest first.
    async fn fetch_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>>;

    async fn post_reply(&self, channel: &str, thread_ts: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct RepliesResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<RawMessage>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thread_ts: Option<String>,
}

impl From<RawMessage> for ThreadMessage {
    fn from(raw: RawMessage) -> Self {
        ThreadMessage::new(raw.user.unwrap_or_default(), raw.text.unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    thread_ts: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

fn api_error(method: &'static str, error: Option<String>) -> BotError {
    BotError::SlackApi {
        method,
        error: error.unwrap_or_else(|| "unknown error".to_string()),
    }
}

/// The first message's `thread_ts`, or `ts` when it is not part of a thread.
fn thread_root(messages: Vec<RawMessage>, ts: &str) -> String {
    messages
        .into_iter()
        .next()
        .and_then(|message| message.thread_ts)
        .unwrap_or_else(|| ts.to_string())
}

pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
}

impl SlackClient {
    pub fn new(http: reqwest::Client, bot_token: String) -> Self {
        Self::with_api_base(http, bot_token, SLACK_API_BASE)
    }

    pub fn with_api_base(http: reqwest::Client, bot_token: String, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
        }
    }

    async fn replies(&self, channel: &str, ts: &str, limit: u32) -> Result<Vec<RawMessage>> {
        const METHOD: &str = "conversations.replies";
        let slack_http = |source| BotError::SlackHttp {
            method: METHOD,
            source,
        };

        let response: RepliesResponse = self
            .http
            .get(format!("{}/{METHOD}", self.api_base))
            .bearer_auth(&self.bot_token)
            .query(&[("channel", channel), ("ts", ts), ("limit", &limit.to_string())])
            .send()
            .await
            .map_err(slack_http)?
            .json()
            .await
            .map_err(slack_http)?;

        if !response.ok {
            return Err(api_error(METHOD, response.error));
        }
        Ok(response.messages)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn resolve_thread_root(&self, channel: &str, ts: &str) -> Result<String> {
        let root = thread_root(self.replies(channel, ts, 1).await?, ts);
        debug!("Resolved thread root for {ts}: {root}");
        Ok(root)
    }

    async fn fetch_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>> {
        let messages = self.replies(channel, thread_ts, limit).await?;
        debug!(
            "Fetched {} messages from thread {thread_ts} in {channel}",
            messages.len()
        );
        Ok(messages.into_iter().map(ThreadMessage::from).collect())
    }

    async fn post_reply(&self, channel: &str, thread_ts: &str, text: &str) -> Result<()> {
        const METHOD: &str = "chat.postMessage";
        let slack_http = |source| BotError::SlackHttp {
            method: METHOD,
            source,
        };

        let response: PostMessageResponse = self
            .http
            .post(format!("{}/{METHOD}", self.api_base))
            .bearer_auth(&self.bot_token)
            .json(&PostMessageRequest {
                channel,
                thread_ts,
                text,
            })
            .send()
            .await
            .map_err(slack_http)?
            .json()
            .await
            .map_err(slack_http)?;

        if !response.ok {
            return Err(api_error(METHOD, response.error));
        }
        Ok(())
    }
}
