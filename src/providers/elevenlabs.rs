use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use zeroize::Zeroize;

use super::{build_http_client, validate_base_url, ProviderError, HTTP_TIMEOUT};
use crate::config::SpeechConfig;
use crate::traits::{SpeechSynthesizer, SpeechTranscriber};

/// ElevenLabs speech client: `scribe` transcription and multilingual TTS.
pub struct ElevenLabsClient {
    client: Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    tts_model: String,
    stt_model: String,
}

impl Drop for ElevenLabsClient {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl ElevenLabsClient {
    pub fn new(config: &SpeechConfig) -> Result<Self, String> {
        validate_base_url(&config.base_url)?;
        let client = build_http_client(HTTP_TIMEOUT)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            voice_id: config.voice_id.clone(),
            tts_model: config.tts_model.clone(),
            stt_model: config.stt_model.clone(),
        })
    }

    fn synthesis_url(&self) -> String {
        format!("{}/text-to-speech/{}", self.base_url, self.voice_id)
    }

    fn transcription_url(&self) -> String {
        format!("{}/speech-to-text", self.base_url)
    }
}

async fn error_for_status(resp: reqwest::Response) -> anyhow::Error {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    error!(status = %status, "Speech API error: {}", body);
    ProviderError::from_status(status.as_u16(), &body).into()
}

#[async_trait]
impl SpeechTranscriber for ElevenLabsClient {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> anyhow::Result<String> {
        info!(bytes = audio.len(), model = %self.stt_model, "Transcribing voice message");

        let part = Part::bytes(audio).file_name(filename.to_string());
        let form = Form::new()
            .part("file", part)
            .text("model_id", self.stt_model.clone());

        let resp = self
            .client
            .post(self.transcription_url())
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        if !resp.status().is_success() {
            return Err(error_for_status(resp).await);
        }

        let parsed: TranscriptionResponse = resp.json().await?;
        Ok(parsed.text)
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        info!(chars = text.chars().count(), voice = %self.voice_id, "Synthesizing speech");

        let body = json!({
            "text": text,
            "model_id": self.tts_model,
        });

        let resp = self
            .client
            .post(self.synthesis_url())
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::network(&e))?;

        if !resp.status().is_success() {
            return Err(error_for_status(resp).await);
        }

        let audio = resp.bytes().await?;
        Ok(audio.to_vec())
    }
}
