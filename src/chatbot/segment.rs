//! Grouping a Slack thread transcript into conversational turns.

/// One message of a thread transcript, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub speaker_id: String,
    pub text: String,
}

impl ThreadMessage {
    pub fn new(speaker_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            text: text.into(),
        }
    }
}

/// A finalized exchange: human text followed by the bot's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub input: String,
    pub output: String,
}

/// Segmentation result: answered turns plus the human text awaiting a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmented {
    pub turns: Vec<Turn>,
    pub pending_input: String,
}

/// The literal mention token Slack inserts for a user id.
#[must_use]
pub fn mention_token(bot_identity: &str) -> String {
    format!("<@{bot_identity}>")
}

/// Split `messages` into turns, treating `bot_identity` as the assistant.
///
/// Consecutive messages from the same side are concatenated without a
/// separator. Bot text after the last human message has nothing to pair with
/// and is dropped.
#[must_use]
pub fn segment(messages: &[ThreadMessage], bot_identity: &str) -> Segmented {
    let token = mention_token(bot_identity);
    let mut turns = Vec::new();
    let mut pending_input = String::new();
    let mut pending_output = String::new();

    for message in messages {
        let text = message.text.replace(&token, "");
        let text = text.trim();

        if message.speaker_id == bot_identity {
            pending_output.push_str(text);
            continue;
        }

        if !pending_output.is_empty() {
            turns.push(Turn {
                input: std::mem::take(&mut pending_input),
                output: std::mem::take(&mut pending_output),
            });
        }
        pending_input.push_str(text);
    }

    Segmented {
        turns,
        pending_input,
    }
}
