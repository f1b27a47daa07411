use tracing::{debug, info, warn};

use super::{log_stage, notify, Outcome, Pipeline, PipelineError, Stage};
use crate::intent::{classify, Intent};
use crate::providers::describe_error;
use crate::traits::{complete, Channel};
use crate::types::{InboundMessage, NoteRecord};

const CHAT_SYSTEM_PROMPT: &str =
    "Ты эксперт IT Go Backend, отвечай коротко и по делу. Меньше 20 слов в ответе.";

pub(super) const NOTE_SAVED: &str = "Мысль сохранена";

/// Voice notes are Opus in an Ogg container.
const VOICE_FILENAME: &str = "audio.ogg";

impl Pipeline {
    pub(super) async fn transcribe_voice(
        &self,
        msg: &InboundMessage,
        channel: &dyn Channel,
        file_id: &str,
    ) -> Result<String, PipelineError> {
        notify(channel, msg.chat_id, "🎧 Распознаю голос...").await;

        let audio = channel
            .download_voice(file_id)
            .await
            .map_err(|e| PipelineError::VoiceDownload(e.to_string()))?;

        let text = self
            .transcriber
            .transcribe(audio, VOICE_FILENAME)
            .await
            .map_err(|e| PipelineError::Transcription(describe_error(&e)))?;

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(PipelineError::Transcription("речь не распознана".to_string()));
        }
        info!(chat_id = msg.chat_id, text = %text, "Voice recognized");
        Ok(text)
    }

    /// Classify `input`, produce the textual answer and hand it to delivery.
    /// `spoken` marks input that came from a voice note.
    pub(super) async fn answer_text(
        &self,
        msg: &InboundMessage,
        channel: &dyn Channel,
        input: String,
        spoken: bool,
    ) -> Result<Outcome, PipelineError> {
        let intent = classify(&input);
        log_stage(msg.chat_id, Stage::Classified);
        debug!(chat_id = msg.chat_id, intent = intent.name(), "Intent classified");

        let answer = match intent {
            Intent::NoteCapture(note) => self.capture_note(msg, &note).await?,
            Intent::StructuredQuery(question) => {
                self.answer_query(msg.chat_id, channel, &question).await?
            }
            Intent::Chat(text) => {
                let status = if spoken {
                    format!("🤖 Вы сказали: \"{}\"\n\nДумаю над ответом...", text)
                } else {
                    "🤖 Думаю над ответом...".to_string()
                };
                notify(channel, msg.chat_id, &status).await;
                self.answer_chat(&text).await?
            }
        };
        log_stage(msg.chat_id, Stage::Answered);
        info!(chat_id = msg.chat_id, answer = %answer, "Answer ready");

        self.deliver_answer(msg, channel, &input, &answer).await
    }

    async fn capture_note(&self, msg: &InboundMessage, note: &str) -> Result<String, PipelineError> {
        if !self.access.is_owner(&msg.sender.username) {
            warn!(
                user_id = msg.sender.user_id,
                username = %msg.sender.username,
                "Note capture attempted by non-owner"
            );
            return Err(PipelineError::PermissionDenied);
        }
        if note.is_empty() {
            return Err(PipelineError::EmptyNote);
        }

        self.notes
            .save_note(&NoteRecord::new(note))
            .await
            .map_err(|e| PipelineError::NoteStorage(e.to_string()))?;
        info!(note, "Note saved");
        Ok(NOTE_SAVED.to_string())
    }

    async fn answer_query(
        &self,
        chat_id: i64,
        channel: &dyn Channel,
        question: &str,
    ) -> Result<String, PipelineError> {
        notify(channel, chat_id, "💾 Обрабатываю запрос к базе данных...").await;

        let query = self.translator.translate(question).await?;
        let rows = self.executor.execute(&query).await?;
        let answer = self.compressor.compress(question, &rows).await?;
        Ok(answer)
    }

    async fn answer_chat(&self, text: &str) -> Result<String, PipelineError> {
        complete(self.provider.as_ref(), &self.model, CHAT_SYSTEM_PROMPT, text)
            .await
            .map_err(|e| PipelineError::Chat(describe_error(&e)))
    }
}
