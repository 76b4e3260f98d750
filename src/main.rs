#[tokio::main]
async fn main() -> slack_chatbot::error::Result<()> {
    let default_filter = std::env::var("LOG_LEVEL")
        .map(|level| format!("slack_chatbot={}", level.to_lowercase()))
        .unwrap_or_else(|_| "slack_chatbot=info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // reqwest and the AWS SDK both link rustls; pick one provider for the process
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        log::debug!("A rustls crypto provider was already installed");
    }

    log::info!("Starting slack-chatbot");

    match slack_chatbot::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {e}");
            Err(e)
        }
    }
}
