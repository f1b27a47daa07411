use std::sync::Arc;

use tracing::info;

use crate::access::AccessController;
use crate::channels::TelegramChannel;
use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use crate::providers::{ElevenLabsClient, OpenAiCompatibleProvider};
use crate::state::SqliteStateStore;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 1. State store
    let state = Arc::new(SqliteStateStore::new(&config.state.db_path).await?);
    info!("State store initialized ({})", config.state.db_path);

    // 2. Language model
    let provider = Arc::new(
        OpenAiCompatibleProvider::new(&config.provider.base_url, &config.provider.api_key)
            .map_err(|e| anyhow::anyhow!("Failed to build model provider: {}", e))?,
    );
    info!(
        base_url = %config.provider.base_url,
        model = %config.provider.model,
        "Model provider configured"
    );

    // 3. Speech
    let speech = Arc::new(
        ElevenLabsClient::new(&config.speech)
            .map_err(|e| anyhow::anyhow!("Failed to build speech client: {}", e))?,
    );
    info!(voice_id = %config.speech.voice_id, "Speech client configured");

    // 4. Access gate
    let access = AccessController::new(state.clone(), &config.access);
    info!(
        owner = %config.access.owner_username,
        daily_limit = config.access.daily_limit,
        fail_open = config.access.fail_open,
        "Access control configured"
    );

    // 5. Pipeline
    let pipeline = Arc::new(Pipeline::new(
        access,
        provider,
        config.provider.model.clone(),
        speech.clone(),
        speech,
        state.clone(),
        state.clone(),
        state.clone(),
    ));

    // 6. Telegram (blocks until Ctrl-C)
    let telegram = Arc::new(
        TelegramChannel::new(&config.telegram.bot_token, pipeline)
            .map_err(|e| anyhow::anyhow!("Failed to build Telegram channel: {}", e))?,
    );
    info!("Starting voxlog v{}", env!("CARGO_PKG_VERSION"));
    telegram.start().await;

    info!("Shutting down");
    state.close().await;
    Ok(())
}
