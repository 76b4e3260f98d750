//! System prompt construction.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::types::Passage;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant in a Slack workspace. \
    People talk to you by mentioning you in a thread, and the thread so far is your \
    conversation history. Answer the latest message directly and in detail. If you do \
    not know the answer, say so instead of guessing.";

/// Base prompt plus dynamic context.
#[must_use]
pub fn system_prompt(base: Option<&str>, now: DateTime<Utc>) -> String {
    let mut prompt = base.unwrap_or(DEFAULT_SYSTEM_PROMPT).to_string();
    let _ = write!(
        prompt,
        "\n\nCurrent datetime: {}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );
    prompt
}

/// Append retrieved passages to a system prompt.
#[must_use]
pub fn with_passages(mut prompt: String, passages: &[Passage]) -> String {
    if passages.is_empty() {
        prompt.push_str(
            "\n\nThe knowledge base returned nothing relevant to this question. \
            Say so if the answer depends on it.",
        );
        return prompt;
    }

    prompt.push_str(
        "\n\nUse the following passages from the knowledge base to answer the question. \
        If they do not contain the answer, say that you don't know rather than making one up.",
    );
    for (index, passage) in passages.iter().enumerate() {
        let _ = write!(prompt, "\n\n[{}]", index + 1);
        if let Some(ref source) = passage.source {
            let _ = write!(prompt, " (source: {source})");
        }
        let _ = write!(prompt, "\n{}", passage.text);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn default_prompt_includes_datetime() {
        let prompt = system_prompt(None, now());
        assert!(prompt.starts_with(DEFAULT_SYSTEM_PROMPT));
        assert!(prompt.ends_with("Current datetime: 2024-05-01 12:30:00 UTC"));
    }

    #[test]
    fn custom_prompt_replaces_default() {
        let prompt = system_prompt(Some("Talk like a pirate."), now());
        assert!(prompt.starts_with("Talk like a pirate."));
        assert!(!prompt.contains(DEFAULT_SYSTEM_PROMPT));
    }

    #[test]
    fn passages_are_numbered_with_sources() {
        let passages = vec![
            Passage {
                text: "Refunds take 5 days.".to_string(),
                source: Some("s3://docs/refunds.md".to_string()),
                score: Some(0.8),
            },
            Passage {
                text: "Support is open 9-5.".to_string(),
                source: None,
                score: None,
            },
        ];
        let prompt = with_passages("base".to_string(), &passages);
        assert!(prompt.contains("[1] (source: s3://docs/refunds.md)\nRefunds take 5 days."));
        assert!(prompt.contains("[2]\nSupport is open 9-5."));
    }

    #[test]
    fn no_passages_is_stated() {
        let prompt = with_passages("base".to_string(), &[]);
        assert!(prompt.contains("returned nothing relevant"));
    }
}
