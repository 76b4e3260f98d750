//! Hand-written doubles for the provider and Slack traits.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::{BotError, Result};
use crate::llm::{ChatModel, Retriever};
use crate::slack::SlackApi;
use crate::types::{ChatMessage, Passage};

use super::segment::ThreadMessage;

#[derive(Clone, Default)]
pub struct MockModel {
    reply: Option<String>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            ..Self::default()
        }
    }

    /// A model whose every call fails like a provider outage.
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<Vec<ChatMessage>> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatModel for MockModel {
    fn provider(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.reply.clone().ok_or_else(|| BotError::OpenAiApi {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "mock outage".to_string(),
        })
    }
}

#[derive(Clone, Default)]
pub struct MockRetriever {
    passages: Option<Vec<Passage>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockRetriever {
    pub fn returning(passages: Vec<Passage>) -> Self {
        Self {
            passages: Some(passages),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>> {
        self.queries.lock().unwrap().push(query.to_string());
        self.passages
            .clone()
            .ok_or_else(|| BotError::KnowledgeBase("mock retrieval failure".to_string()))
    }
}

/// A posted reply: `(channel, thread_ts, text)`.
pub type PostedReply = (String, String, String);

#[derive(Clone, Default)]
pub struct MockSlack {
    /// Thread root reported for any reply timestamp; `None` means every ts is a root.
    pub root: Option<String>,
    pub transcript: Vec<ThreadMessage>,
    pub fail_fetch: bool,
    pub fetches: Arc<Mutex<Vec<(String, String, u32)>>>,
    pub posts: Arc<Mutex<Vec<PostedReply>>>,
}

impl MockSlack {
    pub fn with_transcript(transcript: Vec<ThreadMessage>) -> Self {
        Self {
            transcript,
            ..Self::default()
        }
    }

    pub fn fetches(&self) -> Vec<(String, String, u32)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn posts(&self) -> Vec<PostedReply> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SlackApi for MockSlack {
    async fn resolve_thread_root(&self, _channel: &str, ts: &str) -> Result<String> {
        Ok(self.root.clone().unwrap_or_else(|| ts.to_string()))
    }

    async fn fetch_thread(
        &self,
        channel: &str,
        thread_ts: &str,
        limit: u32,
    ) -> Result<Vec<ThreadMessage>> {
        self.fetches
            .lock()
            .unwrap()
            .push((channel.to_string(), thread_ts.to_string(), limit));
        if self.fail_fetch {
            return Err(BotError::SlackApi {
                method: "conversations.replies",
                error: "channel_not_found".to_string(),
            });
        }
        Ok(self.transcript.clone())
    }

    async fn post_reply(&self, channel: &str, thread_ts: &str, text: &str) -> Result<()> {
        self.posts.lock().unwrap().push((
            channel.to_string(),
            thread_ts.to_string(),
            text.to_string(),
        ));
        Ok(())
    }
}
