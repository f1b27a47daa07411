use std::sync::Arc;

use tracing::info;

use super::{QueryError, RenderedRows};
use crate::providers::describe_error;
use crate::traits::{complete, ModelProvider};

const COMPRESS_SYSTEM_PROMPT: &str = "Ты голосовой помощник. Преобразуй результаты SQL запроса в краткий, понятный голосовой ответ на русском языке.

ВАЖНО:
1. Ответ должен быть КОРОТКИМ (до 30 слов)
2. Говори по-человечески, как будто объясняешь другу
3. Не упоминай технические детали (SQL, базы данных)
4. Если результатов много, обобщи информацию";

fn compression_prompt(question: &str, rows: &RenderedRows) -> String {
    format!(
        "Вопрос пользователя: {}\n\nРезультаты из базы данных:\n{}",
        question, rows.text
    )
}

/// Second model call of the query branch: rows in, one short spoken answer out.
pub struct AnswerCompressor {
    provider: Arc<dyn ModelProvider>,
    model: String,
}

impl AnswerCompressor {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn compress(&self, question: &str, rows: &RenderedRows) -> Result<String, QueryError> {
        let prompt = compression_prompt(question, rows);
        let answer = complete(self.provider.as_ref(), &self.model, COMPRESS_SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| QueryError::Compression(describe_error(&e)))?;
        info!(chars = answer.chars().count(), "Answer compressed");
        Ok(answer)
    }
}
