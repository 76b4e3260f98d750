//! Model and retrieval clients behind object-safe traits.

mod bedrock;
mod knowledge_base;
mod openai;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatMessage, Passage};

pub use bedrock::BedrockChatClient;
pub use knowledge_base::KnowledgeBaseRetriever;
pub use openai::OpenAiClient;

/// A chat completion endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Short provider name for logs, e.g. `openai`.
    fn provider(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Generate the next assistant message for `messages`.
    ///
    /// Implementations return the raw reply text; emptiness is checked by the caller.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// A search capability over a knowledge base.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>>;
}
