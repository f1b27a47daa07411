use async_trait::async_trait;

/// Speech-to-text collaborator.
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// Recognize speech in `audio`. `filename` hints the container format (e.g. "voice.ogg").
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> anyhow::Result<String>;
}

/// Text-to-speech collaborator.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns encoded audio (mp3) for `text`.
    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>>;
}
