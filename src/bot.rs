//! Slack bot core: application context and HTTP server.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use log::{debug, info};
use tokio::net::TcpListener;

use crate::chatbot::ProviderContext;
use crate::config::{BackendConfig, Config};
use crate::error::Result;
use crate::slack::{SlackApi, SlackClient, router};

/// Everything one mention invocation needs, shared read-only across requests.
pub struct AppContext {
    pub slack: Arc<dyn SlackApi>,
    pub backend: BackendConfig,
    pub providers: ProviderContext,
    pub bot_member_id: String,
    pub system_prompt: Option<String>,
    pub thread_history_limit: u32,
    pub signing_secret: Vec<u8>,
}

impl AppContext {
    /// Build the context from configuration, loading AWS settings only when Bedrock is used.
    pub async fn from_config(config: Config) -> Self {
        let http = reqwest::Client::new();

        let aws = match &config.backend {
            BackendConfig::RetrievalAugmented(settings) => {
                debug!("Loading AWS configuration");
                let mut loader = aws_config::defaults(BehaviorVersion::latest());
                if let Some(region) = &settings.region {
                    loader = loader.region(Region::new(region.clone()));
                }
                Some(loader.load().await)
            }
            BackendConfig::DirectChat(_) => None,
        };

        Self {
            slack: Arc::new(SlackClient::new(http.clone(), config.slack_bot_token)),
            backend: config.backend,
            providers: ProviderContext { http, aws },
            bot_member_id: config.slack_bot_member_id,
            system_prompt: config.system_prompt,
            thread_history_limit: config.thread_history_limit,
            signing_secret: config.slack_signing_secret.into_bytes(),
        }
    }
}

/// Run the Slack bot until interrupted.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the listener cannot bind.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;
    let bind_address = config.bind_address.clone();

    info!(
        "Using {} backend ({} {})",
        config.backend,
        config.backend.provider(),
        config.backend.model()
    );
    let ctx = Arc::new(AppContext::from_config(config).await);

    let listener = TcpListener::bind(&bind_address).await?;
    info!("Listening for Slack events on {bind_address}");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received, shutting down...");
        })
        .await?;

    Ok(())
}
