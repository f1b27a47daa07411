//! Per-message answer pipeline.
//!
//! `Received → Gated → Classified → Answered → Synthesized → Delivered →
//! Persisted`, leaving early as `Rejected` or `Failed`. An interaction record
//! is written only once the answer has actually reached the chat.

mod branches;
mod delivery;
mod error;

use std::sync::Arc;

use tracing::{debug, info, warn};

pub use delivery::MAX_SPOKEN_CHARS;
pub use error::PipelineError;

use crate::access::{AccessController, AccessDecision, DenyReason};
use crate::channels::formatting::{build_help_text, build_start_text};
use crate::query::{AnswerCompressor, QueryExecutor, QueryTranslator};
use crate::traits::{
    Channel, InteractionStore, ModelProvider, NoteStore, QueryStore, SpeechSynthesizer,
    SpeechTranscriber,
};
use crate::types::{InboundMessage, MessageKind, Payload};

/// Where a message is in its life. Logged at debug on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Gated,
    Classified,
    Answered,
    Synthesized,
    Delivered,
    Persisted,
}

/// Terminal state of one `handle` call.
#[derive(Debug)]
pub enum Outcome {
    /// Answer delivered and recorded with this output kind.
    Persisted(MessageKind),
    /// Reply delivered with nothing to record, or the record write failed.
    Delivered,
    /// Refused before any work was done (quota, permission, bad input).
    Rejected(PipelineError),
    /// A stage failed; nothing was recorded.
    Failed(PipelineError),
}

pub(crate) fn log_stage(chat_id: i64, stage: Stage) {
    debug!(chat_id, stage = ?stage, "Pipeline stage");
}

pub struct Pipeline {
    access: AccessController,
    provider: Arc<dyn ModelProvider>,
    model: String,
    transcriber: Arc<dyn SpeechTranscriber>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    translator: QueryTranslator,
    executor: QueryExecutor,
    compressor: AnswerCompressor,
    interactions: Arc<dyn InteractionStore>,
    notes: Arc<dyn NoteStore>,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        access: AccessController,
        provider: Arc<dyn ModelProvider>,
        model: String,
        transcriber: Arc<dyn SpeechTranscriber>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        query_store: Arc<dyn QueryStore>,
        interactions: Arc<dyn InteractionStore>,
        notes: Arc<dyn NoteStore>,
    ) -> Self {
        Self {
            access,
            translator: QueryTranslator::new(provider.clone(), model.clone()),
            compressor: AnswerCompressor::new(provider.clone(), model.clone()),
            executor: QueryExecutor::new(query_store),
            provider,
            model,
            transcriber,
            synthesizer,
            interactions,
            notes,
        }
    }

    /// Process one inbound message to completion. Never returns an error:
    /// every failure is reported to the chat and folded into the [`Outcome`].
    pub async fn handle(&self, msg: &InboundMessage, channel: &dyn Channel) -> Outcome {
        log_stage(msg.chat_id, Stage::Received);
        debug!(
            chat_id = msg.chat_id,
            channel = %channel.name(),
            kind = %msg.input_kind(),
            "Handling message"
        );

        match self.run(msg, channel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(reply) = e.user_message() {
                    if let Err(send_err) = channel.send_text(msg.chat_id, &reply).await {
                        warn!(chat_id = msg.chat_id, error = %send_err, "Failed to send error reply");
                    }
                }
                if e.is_rejection() {
                    info!(chat_id = msg.chat_id, user_id = msg.sender.user_id, reason = %e, "Request rejected");
                    Outcome::Rejected(e)
                } else {
                    warn!(chat_id = msg.chat_id, user_id = msg.sender.user_id, error = %e, "Request failed");
                    Outcome::Failed(e)
                }
            }
        }
    }

    async fn run(&self, msg: &InboundMessage, channel: &dyn Channel) -> Result<Outcome, PipelineError> {
        // /start and /help never cost a request.
        if let Payload::Command { name, .. } = &msg.payload {
            match name.as_str() {
                "start" => return Ok(self.reply(channel, msg.chat_id, &build_start_text()).await),
                "help" => {
                    let help = build_help_text(&self.model, self.access.daily_limit());
                    return Ok(self.reply(channel, msg.chat_id, &help).await);
                }
                _ => {}
            }
        }

        self.gate(msg).await?;
        log_stage(msg.chat_id, Stage::Gated);

        match &msg.payload {
            Payload::Command { name, arg } => self.run_command(msg, channel, name, arg).await,
            Payload::Text(text) => self.answer_text(msg, channel, text.clone(), false).await,
            Payload::Voice { file_id } => {
                let recognized = self.transcribe_voice(msg, channel, file_id).await?;
                self.answer_text(msg, channel, recognized, true).await
            }
        }
    }

    async fn gate(&self, msg: &InboundMessage) -> Result<(), PipelineError> {
        match self
            .access
            .check_and_consume(msg.sender.user_id, &msg.sender.username)
            .await
        {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied(DenyReason::QuotaExhausted { limit }) => {
                Err(PipelineError::QuotaExceeded { limit })
            }
            AccessDecision::Denied(DenyReason::StoreUnavailable) => {
                Err(PipelineError::QuotaUnavailable)
            }
        }
    }

    async fn run_command(
        &self,
        msg: &InboundMessage,
        channel: &dyn Channel,
        name: &str,
        arg: &str,
    ) -> Result<Outcome, PipelineError> {
        match name {
            "voice" => self.speak_verbatim(msg.chat_id, channel, arg.trim()).await,
            _ => Ok(self
                .reply(channel, msg.chat_id, "Неизвестная команда. Используйте /help")
                .await),
        }
    }

    /// Plain informational reply. Nothing is recorded either way.
    async fn reply(&self, channel: &dyn Channel, chat_id: i64, text: &str) -> Outcome {
        match channel.send_text(chat_id, text).await {
            Ok(()) => Outcome::Delivered,
            Err(e) => Outcome::Failed(PipelineError::Delivery(e.to_string())),
        }
    }
}

/// Best-effort progress message before a slow step.
pub(crate) async fn notify(channel: &dyn Channel, chat_id: i64, text: &str) {
    if let Err(e) = channel.send_text(chat_id, text).await {
        warn!(chat_id, error = %e, "Failed to send status message");
    }
}
