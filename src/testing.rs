//! Test infrastructure: MockProvider, MockSpeech, TestChannel, and TestHarness.
//!
//! Provides a fully wired Pipeline with scripted collaborators and a
//! temp-file SQLite store, for tests that exercise the real message flow.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::access::AccessController;
use crate::config::AccessConfig;
use crate::pipeline::{Outcome, Pipeline};
use crate::state::SqliteStateStore;
use crate::traits::{
    Channel, ChannelCapabilities, ModelProvider, ProviderResponse, QuotaPolicy, QuotaStore,
    SpeechSynthesizer, SpeechTranscriber, TokenUsage,
};
use crate::types::{InboundMessage, Payload, Sender};

pub const OWNER: &str = "owner";

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// A recorded call to `MockProvider::chat()`.
#[derive(Debug, Clone)]
pub struct MockChatCall {
    pub model: String,
    pub messages: Vec<Value>,
}

/// Mock LLM provider that returns scripted responses.
pub struct MockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    failure: Option<String>,
    pub call_log: Mutex<Vec<MockChatCall>>,
}

impl MockProvider {
    /// Create a provider that always returns "Mock response".
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a provider with a FIFO queue of scripted responses.
    pub fn with_responses(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            failure: None,
            call_log: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
            call_log: Mutex::new(Vec::new()),
        }
    }

    /// Helper: build a text-only ProviderResponse.
    pub fn text_response(text: &str) -> ProviderResponse {
        ProviderResponse {
            content: Some(text.to_string()),
            usage: Some(TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
                model: "mock".to_string(),
            }),
        }
    }

    /// How many times `chat()` was called.
    pub async fn call_count(&self) -> usize {
        self.call_log.lock().await.len()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn chat(&self, model: &str, messages: &[Value]) -> anyhow::Result<ProviderResponse> {
        self.call_log.lock().await.push(MockChatCall {
            model: model.to_string(),
            messages: messages.to_vec(),
        });

        if let Some(message) = &self.failure {
            anyhow::bail!("{}", message);
        }

        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            Ok(MockProvider::text_response("Mock response"))
        } else {
            Ok(responses.remove(0))
        }
    }
}

// ---------------------------------------------------------------------------
// MockSpeech
// ---------------------------------------------------------------------------

/// Scripted transcriber and synthesizer in one.
pub struct MockSpeech {
    pub transcript: Mutex<String>,
    pub fail_transcription: AtomicBool,
    pub fail_synthesis: AtomicBool,
    pub synthesized: Mutex<Vec<String>>,
    pub transcribe_calls: AtomicUsize,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self {
            transcript: Mutex::new(String::new()),
            fail_transcription: AtomicBool::new(false),
            fail_synthesis: AtomicBool::new(false),
            synthesized: Mutex::new(Vec::new()),
            transcribe_calls: AtomicUsize::new(0),
        }
    }

    pub async fn set_transcript(&self, text: &str) {
        *self.transcript.lock().await = text.to_string();
    }

    pub async fn synth_count(&self) -> usize {
        self.synthesized.lock().await.len()
    }
}

#[async_trait]
impl SpeechTranscriber for MockSpeech {
    async fn transcribe(&self, _audio: Vec<u8>, _filename: &str) -> anyhow::Result<String> {
        self.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_transcription.load(Ordering::SeqCst) {
            anyhow::bail!("stt unavailable");
        }
        Ok(self.transcript.lock().await.clone())
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        self.synthesized.lock().await.push(text.to_string());
        if self.fail_synthesis.load(Ordering::SeqCst) {
            anyhow::bail!("tts unavailable");
        }
        Ok(b"ID3mock-audio".to_vec())
    }
}

// ---------------------------------------------------------------------------
// TestChannel
// ---------------------------------------------------------------------------

/// Captured voice attachment.
#[derive(Debug, Clone)]
pub struct SentVoice {
    pub chat_id: i64,
    pub audio: Vec<u8>,
    pub caption: String,
}

/// A test channel that captures all outgoing messages.
pub struct TestChannel {
    pub texts: Mutex<Vec<(i64, String)>>,
    pub voices: Mutex<Vec<SentVoice>>,
    pub fail_voice: AtomicBool,
    pub fail_download: AtomicBool,
}

impl TestChannel {
    pub fn new() -> Self {
        Self {
            texts: Mutex::new(Vec::new()),
            voices: Mutex::new(Vec::new()),
            fail_voice: AtomicBool::new(false),
            fail_download: AtomicBool::new(false),
        }
    }

    /// Text of every message sent, in order.
    pub async fn sent_texts(&self) -> Vec<String> {
        self.texts.lock().await.iter().map(|(_, t)| t.clone()).collect()
    }

    pub async fn last_text(&self) -> Option<String> {
        self.texts.lock().await.last().map(|(_, t)| t.clone())
    }

    pub async fn voice_count(&self) -> usize {
        self.voices.lock().await.len()
    }
}

#[async_trait]
impl Channel for TestChannel {
    fn name(&self) -> String {
        "test".to_string()
    }

    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            max_message_len: 4096,
            max_caption_len: 1024,
        }
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        self.texts.lock().await.push((chat_id, text.to_string()));
        Ok(())
    }

    async fn send_voice(&self, chat_id: i64, audio: &[u8], caption: &str) -> anyhow::Result<()> {
        if self.fail_voice.load(Ordering::SeqCst) {
            anyhow::bail!("Bad Request: VOICE_MESSAGES_FORBIDDEN");
        }
        self.voices.lock().await.push(SentVoice {
            chat_id,
            audio: audio.to_vec(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn download_voice(&self, _file_id: &str) -> anyhow::Result<Vec<u8>> {
        if self.fail_download.load(Ordering::SeqCst) {
            anyhow::bail!("file is too big");
        }
        Ok(b"OggS-mock".to_vec())
    }
}

// ---------------------------------------------------------------------------
// FailingQuotaStore
// ---------------------------------------------------------------------------

/// Quota store whose every call fails, for fail-open/fail-closed tests.
pub struct FailingQuotaStore;

#[async_trait]
impl QuotaStore for FailingQuotaStore {
    async fn consume_quota(
        &self,
        _user_id: i64,
        _username: &str,
        _today: NaiveDate,
        _policy: QuotaPolicy,
    ) -> anyhow::Result<Option<u32>> {
        anyhow::bail!("database is locked")
    }
}

// ---------------------------------------------------------------------------
// TestHarness
// ---------------------------------------------------------------------------

/// Everything needed to run integration tests against the pipeline.
pub struct TestHarness {
    pub pipeline: Pipeline,
    pub state: Arc<SqliteStateStore>,
    pub provider: Arc<MockProvider>,
    pub speech: Arc<MockSpeech>,
    pub channel: Arc<TestChannel>,
    /// Keeps the temp DB file alive until the harness drops.
    _db_file: tempfile::NamedTempFile,
}

impl TestHarness {
    pub async fn send(&self, msg: InboundMessage) -> Outcome {
        self.pipeline.handle(&msg, self.channel.as_ref()).await
    }
}

pub fn test_access_config() -> AccessConfig {
    AccessConfig {
        owner_username: OWNER.to_string(),
        daily_limit: 2,
        fail_open: true,
        first_contact_free: false,
    }
}

/// Build a fully-wired pipeline with mock collaborators and temp-file SQLite DB.
///
/// Each call creates an isolated database, so tests can run in parallel.
pub async fn setup_test_pipeline(provider: MockProvider) -> anyhow::Result<TestHarness> {
    setup_test_pipeline_with(provider, test_access_config()).await
}

pub async fn setup_test_pipeline_with(
    provider: MockProvider,
    access: AccessConfig,
) -> anyhow::Result<TestHarness> {
    // Temp file for SQLite (pool needs a real file, not :memory:)
    let db_file = tempfile::NamedTempFile::new()?;
    let db_path = db_file.path().to_string_lossy().to_string();
    let state = Arc::new(SqliteStateStore::new(&db_path).await?);

    let provider = Arc::new(provider);
    let speech = Arc::new(MockSpeech::new());

    let pipeline = Pipeline::new(
        AccessController::new(state.clone(), &access),
        provider.clone(),
        "mock-model".to_string(),
        speech.clone(),
        speech.clone(),
        state.clone(),
        state.clone(),
        state.clone(),
    );

    Ok(TestHarness {
        pipeline,
        state,
        provider,
        speech,
        channel: Arc::new(TestChannel::new()),
        _db_file: db_file,
    })
}

fn message(user_id: i64, username: &str, payload: Payload) -> InboundMessage {
    InboundMessage {
        chat_id: user_id,
        sender: Sender {
            user_id,
            username: username.to_string(),
        },
        payload,
    }
}

pub fn text_message(user_id: i64, username: &str, text: &str) -> InboundMessage {
    message(user_id, username, Payload::Text(text.to_string()))
}

pub fn voice_message(user_id: i64, username: &str) -> InboundMessage {
    message(
        user_id,
        username,
        Payload::Voice {
            file_id: "AwACAgIAAxkBAAIB".to_string(),
        },
    )
}

pub fn command_message(user_id: i64, username: &str, name: &str, arg: &str) -> InboundMessage {
    message(
        user_id,
        username,
        Payload::Command {
            name: name.to_string(),
            arg: arg.to_string(),
        },
    )
}
