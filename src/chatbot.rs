//! Thread answering - turns a Slack thread into a model reply.

mod backend;
mod executor;
mod handler;
mod prompt;
mod segment;
#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{Backend, KNOWLEDGE_BASE_TOP_K, ProviderContext, select};
pub use executor::run;
pub use handler::handle_app_mention;
pub use prompt::{DEFAULT_SYSTEM_PROMPT, system_prompt};
pub use segment::{Segmented, ThreadMessage, Turn, segment};
