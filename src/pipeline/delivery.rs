use chrono::Utc;
use tracing::{error, info};

use super::{log_stage, notify, Outcome, Pipeline, PipelineError, Stage};
use crate::channels::formatting::truncate_caption;
use crate::providers::describe_error;
use crate::traits::Channel;
use crate::types::{InboundMessage, InteractionRecord, MessageKind};

/// Longest answer, in characters, that is still voiced.
pub const MAX_SPOKEN_CHARS: usize = 500;

fn voice_caption(channel: &dyn Channel, text: &str) -> String {
    truncate_caption(
        &format!("🔊 {}", text),
        channel.capabilities().max_caption_len,
    )
}

impl Pipeline {
    /// Voice the answer (or send it as text when too long), then record the
    /// exchange. Nothing is recorded unless the channel accepted the reply.
    pub(super) async fn deliver_answer(
        &self,
        msg: &InboundMessage,
        channel: &dyn Channel,
        input: &str,
        answer: &str,
    ) -> Result<Outcome, PipelineError> {
        if answer.chars().count() > MAX_SPOKEN_CHARS {
            let text = format!(
                "📝 {}\n\n⚠️ Ответ слишком длинный для озвучивания (макс. {} символов)",
                answer, MAX_SPOKEN_CHARS
            );
            channel
                .send_text(msg.chat_id, &text)
                .await
                .map_err(|e| PipelineError::Delivery(e.to_string()))?;
            log_stage(msg.chat_id, Stage::Delivered);
            return Ok(self.persist(msg, input, MessageKind::Text, answer).await);
        }

        notify(channel, msg.chat_id, "🎤 Генерирую голосовое сообщение...").await;
        let audio = self
            .synthesizer
            .synthesize(answer)
            .await
            .map_err(|e| PipelineError::Synthesis {
                answer: Some(answer.to_string()),
                reason: describe_error(&e),
            })?;
        log_stage(msg.chat_id, Stage::Synthesized);

        channel
            .send_voice(msg.chat_id, &audio, &voice_caption(channel, answer))
            .await
            .map_err(|e| PipelineError::Delivery(e.to_string()))?;
        log_stage(msg.chat_id, Stage::Delivered);

        Ok(self.persist(msg, input, MessageKind::Voice, answer).await)
    }

    async fn persist(
        &self,
        msg: &InboundMessage,
        input: &str,
        output_kind: MessageKind,
        answer: &str,
    ) -> Outcome {
        let record = InteractionRecord {
            timestamp: Utc::now(),
            user_id: msg.sender.user_id,
            username: msg.sender.username.clone(),
            input_kind: msg.input_kind(),
            input_text: input.to_string(),
            output_kind,
            output_text: answer.to_string(),
        };

        match self.interactions.append_interaction(&record).await {
            Ok(()) => {
                log_stage(msg.chat_id, Stage::Persisted);
                info!(chat_id = msg.chat_id, user_id = msg.sender.user_id, "Interaction saved");
                Outcome::Persisted(output_kind)
            }
            Err(e) => {
                // The user already has the answer; only the history row is lost.
                error!(chat_id = msg.chat_id, error = %e, "Failed to save interaction");
                Outcome::Delivered
            }
        }
    }

    /// `/voice <text>`: speak the text as-is. No model call, no record.
    pub(super) async fn speak_verbatim(
        &self,
        chat_id: i64,
        channel: &dyn Channel,
        text: &str,
    ) -> Result<Outcome, PipelineError> {
        if text.is_empty() {
            return Err(PipelineError::MissingVoiceText);
        }

        notify(channel, chat_id, "🎤 Генерирую голосовое сообщение...").await;
        let audio = self
            .synthesizer
            .synthesize(text)
            .await
            .map_err(|e| PipelineError::Synthesis {
                answer: None,
                reason: describe_error(&e),
            })?;

        if let Err(e) = channel.send_voice(chat_id, &audio, &voice_caption(channel, text)).await {
            notify(channel, chat_id, "❌ Ошибка отправки голосового сообщения").await;
            return Err(PipelineError::Delivery(e.to_string()));
        }
        Ok(Outcome::Delivered)
    }
}
