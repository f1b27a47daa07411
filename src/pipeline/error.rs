use thiserror::Error;

use crate::query::QueryError;
use crate::utils::plural_ru;

/// Every way a request can end without a delivered answer. Each variant maps
/// to exactly one chat reply via [`PipelineError::user_message`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("daily limit of {limit} requests reached")]
    QuotaExceeded { limit: u32 },

    #[error("quota store unavailable")]
    QuotaUnavailable,

    #[error("note capture is reserved for the owner")]
    PermissionDenied,

    #[error("note text is empty")]
    EmptyNote,

    #[error("/voice without text")]
    MissingVoiceText,

    #[error("note storage failed: {0}")]
    NoteStorage(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("chat completion failed: {0}")]
    Chat(String),

    #[error("voice download failed: {0}")]
    VoiceDownload(String),

    #[error("transcription failed: {0}")]
    Transcription(String),

    /// `answer` is the text that could not be voiced; it is still shown to the user.
    #[error("speech synthesis failed: {reason}")]
    Synthesis {
        answer: Option<String>,
        reason: String,
    },

    #[error("delivery failed: {0}")]
    Delivery(String),
}

impl PipelineError {
    /// Rejections are refusals the user can act on; everything else is a failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PipelineError::QuotaExceeded { .. }
                | PipelineError::QuotaUnavailable
                | PipelineError::PermissionDenied
                | PipelineError::EmptyNote
                | PipelineError::MissingVoiceText
        )
    }

    /// The chat reply for this error. `None` means the user is not told
    /// (the transport itself is what failed).
    pub fn user_message(&self) -> Option<String> {
        let text = match self {
            PipelineError::QuotaExceeded { limit } => format!(
                "⏳ Вы достигли дневного лимита запросов ({} {} в день).\n\n\
                 Лимит обновляется каждый день в 00:00 по времени сервера.\n\
                 Спасибо за понимание! 🙏",
                limit,
                plural_ru(*limit, "запрос", "запроса", "запросов")
            ),
            PipelineError::QuotaUnavailable => {
                "⚠️ Сервис временно недоступен, попробуйте позже.".to_string()
            }
            PipelineError::PermissionDenied => "❌ У вас нет доступа к этой функции".to_string(),
            PipelineError::EmptyNote => "❌ Укажите текст мысли после слова 'мысль'".to_string(),
            PipelineError::MissingVoiceText => {
                "Укажите текст после команды:\n/voice Ваш текст здесь".to_string()
            }
            PipelineError::NoteStorage(e) => format!("❌ Ошибка сохранения: {}", e),
            PipelineError::Query(e) => e.user_message(),
            PipelineError::Chat(e) => format!("❌ Ошибка получения ответа от ChatGPT: {}", e),
            PipelineError::VoiceDownload(_) => "❌ Ошибка получения голосового файла".to_string(),
            PipelineError::Transcription(e) => format!("❌ Ошибка распознавания: {}", e),
            PipelineError::Synthesis {
                answer: Some(answer),
                reason,
            } => format!("📝 {}\n\n❌ Ошибка генерации голоса: {}", answer, reason),
            PipelineError::Synthesis {
                answer: None,
                reason,
            } => format!("❌ Ошибка генерации голоса: {}", reason),
            PipelineError::Delivery(_) => return None,
        };
        Some(text)
    }
}
