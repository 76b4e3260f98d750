//! Replaying turns into memory and generating the reply.

use log::debug;

use crate::error::{BotError, Result};
use crate::types::ChatMessage;

use super::backend::Backend;
use super::prompt::with_passages;
use super::segment::Turn;

/// Conversation history rebuilt for a single invocation.
#[derive(Debug, Default)]
struct ConversationMemory {
    messages: Vec<ChatMessage>,
}

impl ConversationMemory {
    fn replay(turns: &[Turn]) -> Self {
        let mut messages = Vec::with_capacity(turns.len() * 2);
        for turn in turns {
            messages.push(ChatMessage::user(turn.input.as_str()));
            messages.push(ChatMessage::assistant(turn.output.as_str()));
        }
        Self { messages }
    }

    fn into_request(self, system_prompt: String, input: &str) -> Vec<ChatMessage> {
        let mut request = Vec::with_capacity(self.messages.len() + 2);
        request.push(ChatMessage::system(system_prompt));
        request.extend(self.messages);
        request.push(ChatMessage::user(input));
        request
    }
}

/// Generate a reply to `pending_input` given the prior `turns`.
///
/// With a retriever attached, passages for `pending_input` are fetched first
/// and added to the system prompt.
///
/// # Errors
///
/// [`BotError::EmptyRequest`] if `pending_input` is blank (the backend is not
/// called); any provider error, or [`BotError::EmptyReply`] when the model
/// returns no text.
pub async fn run(
    turns: &[Turn],
    pending_input: &str,
    backend: &Backend,
    system_prompt: &str,
) -> Result<String> {
    let input = pending_input.trim();
    if input.is_empty() {
        return Err(BotError::EmptyRequest);
    }

    let memory = ConversationMemory::replay(turns);

    let system_prompt = match backend.retriever() {
        Some(retriever) => {
            let passages = retriever.retrieve(input).await?;
            debug!("Conditioning on {} retrieved passages", passages.len());
            with_passages(system_prompt.to_string(), &passages)
        }
        None => system_prompt.to_string(),
    };

    let messages = memory.into_request(system_prompt, input);
    let model = backend.model();
    debug!(
        "Generating with {} ({}) over {} messages",
        model.provider(),
        model.model(),
        messages.len()
    );

    let reply = model.complete(&messages).await?;
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(BotError::EmptyReply {
            provider: model.provider(),
        });
    }
    Ok(reply.to_string())
}
