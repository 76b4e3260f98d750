//! Choosing and building the generation backend for one invocation.

use aws_config::SdkConfig;
use log::debug;

use crate::config::BackendConfig;
use crate::error::{BotError, Result};
use crate::llm::{BedrockChatClient, ChatModel, KnowledgeBaseRetriever, OpenAiClient, Retriever};

/// Number of knowledge base passages consulted per question.
pub const KNOWLEDGE_BASE_TOP_K: i32 = 4;

/// Long-lived handles the selector builds provider clients from.
#[derive(Debug, Clone)]
pub struct ProviderContext {
    pub http: reqwest::Client,
    /// Loaded only when a Bedrock backend is configured.
    pub aws: Option<SdkConfig>,
}

/// A chat model with an optional retriever, owned by one invocation.
pub struct Backend {
    model: Box<dyn ChatModel>,
    retriever: Option<Box<dyn Retriever>>,
}

impl Backend {
    #[must_use]
    pub fn new(model: Box<dyn ChatModel>, retriever: Option<Box<dyn Retriever>>) -> Self {
        Self { model, retriever }
    }

    #[must_use]
    pub fn model(&self) -> &dyn ChatModel {
        self.model.as_ref()
    }

    #[must_use]
    pub fn retriever(&self) -> Option<&dyn Retriever> {
        self.retriever.as_deref()
    }
}

/// Build the backend described by `config`.
///
/// Only constructs clients; no request is sent until the executor runs.
///
/// # Errors
///
/// Returns [`BotError::Config`] if a Bedrock backend is requested but no AWS
/// configuration was loaded.
pub fn select(config: &BackendConfig, providers: &ProviderContext) -> Result<Backend> {
    match config {
        BackendConfig::DirectChat(settings) => {
            debug!("Using OpenAI-compatible chat with model {}", settings.model);
            let model = OpenAiClient::new(
                providers.http.clone(),
                settings.api_key.clone(),
                settings.model.clone(),
                settings.base_url.as_deref(),
            );
            Ok(Backend::new(Box::new(model), None))
        }
        BackendConfig::RetrievalAugmented(settings) => {
            let aws = providers.aws.as_ref().ok_or_else(|| {
                BotError::Config("Bedrock backend selected but AWS config is not loaded".to_string())
            })?;
            debug!("Using Bedrock with model {}", settings.model);
            let region = settings.region.as_deref();
            let model = BedrockChatClient::new(aws, settings.model.clone(), region);

            let retriever = settings.knowledge_base_id.as_ref().map(|id| {
                debug!("Attaching knowledge base {id} (top {KNOWLEDGE_BASE_TOP_K})");
                Box::new(KnowledgeBaseRetriever::new(
                    aws,
                    id.clone(),
                    KNOWLEDGE_BASE_TOP_K,
                    region,
                )) as Box<dyn Retriever>
            });

            Ok(Backend::new(Box::new(model), retriever))
        }
    }
}
