//! Slack Events API endpoint.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::bot::AppContext;
use crate::chatbot::handle_app_mention;

use super::signature;

const RETRY_HEADER: &str = "x-slack-retry-num";
const SIGNATURE_HEADER: &str = "x-slack-signature";
const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// The fields of an `app_mention` event the handler uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MentionEvent {
    pub channel: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub text: String,
    pub ts: String,
    pub event_ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SlackPayload {
    UrlVerification { challenge: String },
    EventCallback { event: SlackEvent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SlackEvent {
    AppMention(MentionEvent),
    #[serde(other)]
    Other,
}

/// Routes: `POST /slack/events` and `GET /health`.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/slack/events", post(slack_events))
        .route("/health", get(|| async { "ok" }))
        .with_state(ctx)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Verify, acknowledge, and hand mentions off to a background task.
async fn slack_events(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(e) = signature::verify(
        &ctx.signing_secret,
        header(&headers, TIMESTAMP_HEADER),
        &body,
        header(&headers, SIGNATURE_HEADER),
        Utc::now().timestamp(),
    ) {
        warn!("Rejected Slack request: {e}");
        return (StatusCode::UNAUTHORIZED, "invalid signature").into_response();
    }

    if headers.contains_key(RETRY_HEADER) {
        info!(
            "Retry request ignored (attempt {})",
            header(&headers, RETRY_HEADER)
        );
        return (StatusCode::OK, "Retry request ignored").into_response();
    }

    let payload: SlackPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Failed to parse Slack payload: {e}");
            return (StatusCode::BAD_REQUEST, "invalid payload").into_response();
        }
    };

    match payload {
        SlackPayload::UrlVerification { challenge } => (StatusCode::OK, challenge).into_response(),
        SlackPayload::EventCallback {
            event: SlackEvent::AppMention(event),
        } => {
            if event.user == ctx.bot_member_id {
                debug!("Ignoring mention authored by the bot itself");
                return StatusCode::OK.into_response();
            }
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                if let Err(e) = handle_app_mention(&ctx, &event).await {
                    debug!("Mention in channel {} ended with: {e}", event.channel);
                }
            });
            StatusCode::OK.into_response()
        }
        SlackPayload::EventCallback {
            event: SlackEvent::Other,
        }
        | SlackPayload::Other => {
            debug!("Ignoring unhandled Slack payload");
            StatusCode::OK.into_response()
        }
    }
}
