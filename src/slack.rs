//! Slack boundary: Events API route, signature checks, and the Web API client.

mod api;
mod events;
pub mod signature;

pub use api::{SlackApi, SlackClient};
pub use events::{MentionEvent, router};
