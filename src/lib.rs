pub mod bot;
pub mod chatbot;
pub mod config;
pub mod error;
pub mod llm;
pub mod slack;
pub mod types;

pub use bot::run;
