//! Amazon Bedrock chat via the Converse API.

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_bedrockruntime::{
    Client,
    error::{DisplayErrorContext, SdkError},
    operation::converse::ConverseError,
    types::{ContentBlock, ConversationRole, Message, SystemContentBlock},
};
use log::debug;

use crate::error::{BotError, Result};
use crate::types::{ChatMessage, MessageRole};

use super::ChatModel;

/// User text standing in for a thread the bot opened, since Converse must start with a user turn.
const OPENING_PLACEHOLDER: &str = "(thread opened by the assistant)";

pub struct BedrockChatClient {
    client: Client,
    model: String,
}

impl BedrockChatClient {
    /// Build a Converse client from the shared SDK config, optionally pinned to `region`.
    #[must_use]
    pub fn new(config: &SdkConfig, model: String, region: Option<&str>) -> Self {
        let mut builder = aws_sdk_bedrockruntime::config::Builder::from(config);
        if let Some(region) = region {
            builder = builder.region(Region::new(region.to_string()));
        }
        Self {
            client: Client::from_conf(builder.build()),
            model,
        }
    }
}

/// Split system text from the dialogue and shape the dialogue the way Converse
/// accepts it: no empty blocks, strictly alternating roles, user first.
/// Assistant text that opens the dialogue is kept behind a placeholder user turn.
fn split_conversation(messages: &[ChatMessage]) -> (Vec<String>, Vec<(ConversationRole, String)>) {
    let mut system = Vec::new();
    let mut dialogue: Vec<(ConversationRole, String)> = Vec::new();

    for message in messages {
        let text = message.content.trim();
        if text.is_empty() {
            continue;
        }
        let role = match message.role {
            MessageRole::System => {
                system.push(text.to_string());
                continue;
            }
            MessageRole::User => ConversationRole::User,
            MessageRole::Assistant => ConversationRole::Assistant,
        };
        if dialogue.is_empty() && role == ConversationRole::Assistant {
            dialogue.push((ConversationRole::User, OPENING_PLACEHOLDER.to_string()));
        }
        match dialogue.last_mut() {
            Some((last_role, last_text)) if *last_role == role => {
                last_text.push_str("\n\n");
                last_text.push_str(text);
            }
            _ => dialogue.push((role, text.to_string())),
        }
    }

    (system, dialogue)
}

fn converse_error(err: &SdkError<ConverseError>) -> BotError {
    let throttled = err
        .as_service_error()
        .is_some_and(ConverseError::is_throttling_exception);
    BotError::Bedrock {
        message: DisplayErrorContext(err).to_string(),
        throttled,
    }
}

#[async_trait]
impl ChatModel for BedrockChatClient {
    fn provider(&self) -> &'static str {
        "bedrock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let (system, dialogue) = split_conversation(messages);
        debug!(
            "Sending Converse request to {} with {} system blocks and {} messages",
            self.model,
            system.len(),
            dialogue.len()
        );

        let converse_messages = dialogue
            .into_iter()
            .map(|(role, text)| {
                Message::builder()
                    .role(role)
                    .content(ContentBlock::Text(text))
                    .build()
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| BotError::Bedrock {
                message: e.to_string(),
                throttled: false,
            })?;

        let system_blocks: Vec<SystemContentBlock> =
            system.into_iter().map(SystemContentBlock::Text).collect();

        let response = self
            .client
            .converse()
            .model_id(&self.model)
            .set_system((!system_blocks.is_empty()).then_some(system_blocks))
            .set_messages(Some(converse_messages))
            .send()
            .await
            .map_err(|e| converse_error(&e))?;

        let reply = response
            .output()
            .and_then(|output| output.as_message().ok())
            .map(|message| {
                message
                    .content()
                    .iter()
                    .filter_map(|block| block.as_text().ok())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .ok_or_else(|| BotError::Bedrock {
                message: "Converse response contained no message".to_string(),
                throttled: false,
            })?;

        debug!("Received {} characters from Bedrock", reply.len());
        Ok(reply)
    }
}
