use async_trait::async_trait;

/// Capabilities that vary by channel.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    /// Maximum text message length in characters. Longer replies are split.
    pub max_message_len: usize,
    /// Maximum caption length on media attachments.
    pub max_caption_len: usize,
}

/// A messaging channel the pipeline talks back through.
///
/// Implementations handle the transport; the pipeline only sees chat ids,
/// text, and raw audio bytes.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique name for this channel (e.g., "telegram").
    fn name(&self) -> String;

    fn capabilities(&self) -> ChannelCapabilities;

    /// Send a text reply to a chat.
    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()>;

    /// Send a voice attachment with a caption. `Ok` means the transport accepted it.
    async fn send_voice(&self, chat_id: i64, audio: &[u8], caption: &str) -> anyhow::Result<()>;

    /// Fetch the audio behind an inbound voice message.
    async fn download_voice(&self, file_id: &str) -> anyhow::Result<Vec<u8>>;
}
