//! Main handler for app mentions.

use chrono::Utc;
use log::{debug, error, info, warn};

use crate::bot::AppContext;
use crate::config::BackendConfig;
use crate::error::{ErrorKind, Result};
use crate::slack::{MentionEvent, SlackApi};

use super::backend::{Backend, select};
use super::executor;
use super::prompt::system_prompt;
use super::segment::{Segmented, segment};

/// Per-invocation settings for answering a thread.
struct ThreadSettings<'a> {
    bot_member_id: &'a str,
    history_limit: u32,
    system_prompt: &'a str,
    backend: &'a BackendConfig,
}

/// Answer a mention by replying once into its thread.
///
/// Failures are turned into a user-facing reply; the returned error only
/// reports that the reply itself could not be posted.
pub async fn handle_app_mention(ctx: &AppContext, event: &MentionEvent) -> Result<()> {
    let prompt = system_prompt(ctx.system_prompt.as_deref(), Utc::now());
    let settings = ThreadSettings {
        bot_member_id: &ctx.bot_member_id,
        history_limit: ctx.thread_history_limit,
        system_prompt: &prompt,
        backend: &ctx.backend,
    };

    respond(ctx.slack.as_ref(), &settings, event, || {
        select(&ctx.backend, &ctx.providers)
    })
    .await
}

async fn respond<F>(
    slack: &dyn SlackApi,
    settings: &ThreadSettings<'_>,
    event: &MentionEvent,
    build_backend: F,
) -> Result<()>
where
    F: FnOnce() -> Result<Backend>,
{
    info!(
        "Received mention from {} in channel {}: {}",
        event.user, event.channel, event.text
    );

    let thread_ts = match event.thread_ts.as_deref() {
        Some(ts) => Ok(ts.to_string()),
        None => slack.resolve_thread_root(&event.channel, &event.event_ts).await,
    };

    let (reply_ts, outcome) = match thread_ts {
        Ok(thread_ts) => {
            let outcome = answer(slack, settings, &event.channel, &thread_ts, build_backend).await;
            (thread_ts, outcome)
        }
        Err(e) => (event.event_ts.clone(), Err(e)),
    };

    let text = match outcome {
        Ok(text) => text,
        Err(e) => {
            let kind = e.kind();
            if kind == ErrorKind::EmptyRequest {
                warn!(
                    "Mention from {} in channel {} has nothing to answer",
                    event.user, event.channel
                );
            } else {
                error!(
                    "Error answering {} in channel {} thread {} ({kind}, backend {} via {} {}): {e}",
                    event.user,
                    event.channel,
                    reply_ts,
                    settings.backend,
                    settings.backend.provider(),
                    settings.backend.model()
                );
            }
            e.user_message()
        }
    };

    slack
        .post_reply(&event.channel, &reply_ts, &text)
        .await
        .inspect_err(|e| error!("Failed to post reply in channel {}: {e}", event.channel))?;

    info!(
        "Replied in channel {} thread {} ({} characters)",
        event.channel,
        reply_ts,
        text.len()
    );
    Ok(())
}

async fn answer<F>(
    slack: &dyn SlackApi,
    settings: &ThreadSettings<'_>,
    channel: &str,
    thread_ts: &str,
    build_backend: F,
) -> Result<String>
where
    F: FnOnce() -> Result<Backend>,
{
    let messages = slack
        .fetch_thread(channel, thread_ts, settings.history_limit)
        .await?;
    let bot_messages = messages
        .iter()
        .filter(|message| message.speaker_id == settings.bot_member_id)
        .count();

    let Segmented {
        turns,
        pending_input,
    } = segment(&messages, settings.bot_member_id);
    debug!(
        "Thread {thread_ts} has {} messages ({} human, {bot_messages} bot) forming {} turns",
        messages.len(),
        messages.len() - bot_messages,
        turns.len()
    );

    let backend = build_backend()?;
    executor::run(&turns, &pending_input, &backend, settings.system_prompt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chatbot::segment::ThreadMessage;
    use crate::chatbot::test_support::{MockModel, MockSlack};
    use crate::config::ChatGptSettings;
    use crate::error::BotError;
    use crate::types::ChatMessage;

    const BOT: &str = "UBOT";

    fn backend_config() -> BackendConfig {
        BackendConfig::DirectChat(ChatGptSettings {
            api_key: "sk-test".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
        })
    }

    fn mention(thread_ts: Option<&str>) -> MentionEvent {
        MentionEvent {
            channel: "C1".to_string(),
            user: "U1".to_string(),
            text: "<@UBOT> how are you".to_string(),
            ts: "300.0".to_string(),
            event_ts: "300.0".to_string(),
            thread_ts: thread_ts.map(ToString::to_string),
        }
    }

    fn transcript() -> Vec<ThreadMessage> {
        vec![
            ThreadMessage::new("U1", "<@UBOT> hi"),
            ThreadMessage::new(BOT, "hello"),
            ThreadMessage::new("U1", "<@UBOT> how are you"),
        ]
    }

    async fn respond_with(slack: &MockSlack, model: &MockModel, event: &MentionEvent) -> Result<()> {
        let config = backend_config();
        let settings = ThreadSettings {
            bot_member_id: BOT,
            history_limit: 30,
            system_prompt: "system",
            backend: &config,
        };
        respond(slack, &settings, event, || {
            Ok(Backend::new(Box::new(model.clone()), None))
        })
        .await
    }

    #[tokio::test]
    async fn answers_thread_and_posts_once() {
        let slack = MockSlack::with_transcript(transcript());
        let model = MockModel::replying("I'm well.");

        respond_with(&slack, &model, &mention(Some("100.0")))
            .await
            .expect("handled");

        assert_eq!(
            slack.fetches(),
            vec![("C1".to_string(), "100.0".to_string(), 30)]
        );
        assert_eq!(
            model.last_request().expect("model was called"),
            vec![
                ChatMessage::system("system"),
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello"),
                ChatMessage::user("how are you"),
            ]
        );
        assert_eq!(
            slack.posts(),
            vec![(
                "C1".to_string(),
                "100.0".to_string(),
                "I'm well.".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn reply_timestamp_is_resolved_to_thread_root() {
        let slack = MockSlack {
            root: Some("100.0".to_string()),
            ..MockSlack::with_transcript(transcript())
        };
        let model = MockModel::replying("ok");

        respond_with(&slack, &model, &mention(None)).await.expect("handled");

        assert_eq!(slack.fetches()[0].1, "100.0");
        assert_eq!(slack.posts()[0].1, "100.0");
    }

    #[tokio::test]
    async fn generation_failure_posts_error_message_only() {
        let slack = MockSlack::with_transcript(transcript());
        let model = MockModel::failing();

        respond_with(&slack, &model, &mention(Some("100.0")))
            .await
            .expect("handled");

        let expected = BotError::OpenAiApi {
            status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            message: String::new(),
        }
        .user_message();
        let posts = slack.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].2, expected);
    }

    #[tokio::test]
    async fn fetch_failure_skips_generation() {
        let slack = MockSlack {
            fail_fetch: true,
            ..MockSlack::default()
        };
        let model = MockModel::replying("unused");

        respond_with(&slack, &model, &mention(Some("100.0")))
            .await
            .expect("handled");

        assert_eq!(model.calls(), 0);
        let posts = slack.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].2.contains("couldn't read this thread"));
    }

    #[tokio::test]
    async fn bare_mention_gets_a_clarification() {
        let slack = MockSlack::with_transcript(vec![ThreadMessage::new("U1", "<@UBOT>")]);
        let model = MockModel::replying("unused");

        respond_with(&slack, &model, &mention(None)).await.expect("handled");

        assert_eq!(model.calls(), 0);
        let posts = slack.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].1, "300.0");
        assert_eq!(posts[0].2, BotError::EmptyRequest.user_message());
    }

    #[tokio::test]
    async fn backend_build_failure_is_reported() {
        let slack = MockSlack::with_transcript(transcript());
        let config = backend_config();
        let settings = ThreadSettings {
            bot_member_id: BOT,
            history_limit: 30,
            system_prompt: "system",
            backend: &config,
        };

        respond(&slack, &settings, &mention(Some("100.0")), || {
            Err(BotError::Config("AWS config is not loaded".to_string()))
        })
        .await
        .expect("handled");

        let posts = slack.posts();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].2.contains("configuration issue"));
    }
}
