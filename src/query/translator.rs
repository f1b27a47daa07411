use std::sync::Arc;

use tracing::info;

use super::{QueryError, TranslatedQuery};
use crate::providers::describe_error;
use crate::traits::{complete, ModelProvider};

/// Schema, rules and phrase templates for the SQL model call. Only the
/// `messages` and `thoughts` tables are described; quota bookkeeping stays
/// out of reach of generated queries.
const SQL_SYSTEM_PROMPT: &str = r#"Ты эксперт SQL. Преобразуй запрос пользователя в SQL запрос для SQLite базы данных.

База данных содержит ДВЕ таблицы:

1. Таблица messages (история сообщений):
- id (INTEGER PRIMARY KEY)
- timestamp (DATETIME)
- user_id (INTEGER)
- username (TEXT)
- message_type (TEXT) - тип сообщения: 'text' или 'voice'
- input_text (TEXT) - текст входящего сообщения
- response_type (TEXT) - тип ответа
- response_text (TEXT) - текст ответа

2. Таблица thoughts (мысли/заметки):
- id (INTEGER PRIMARY KEY)
- timestamp (DATETIME)
- thought_text (TEXT) - текст мысли
- category (TEXT) - категория мысли

ВАЖНО:
1. Отвечай ТОЛЬКО SQL запросом, без объяснений
2. Используй SELECT запросы
3. Ограничивай результаты через LIMIT если нужно
4. НЕ используй DELETE, DROP, UPDATE, INSERT
5. По умолчанию НЕ включай в SELECT поля user_id и username (если пользователь явно не спрашивает про пользователей)
6. Используй LIMIT 10 по умолчанию для запросов "покажи записи"

ШАБЛОНЫ ЗАПРОСОВ:

Подсчет:
- "сколько сообщений" → SELECT COUNT(*) as count FROM messages
- "сколько голосовых" → SELECT COUNT(*) as count FROM messages WHERE message_type='voice'
- "сколько текстовых" → SELECT COUNT(*) as count FROM messages WHERE message_type='text'

Последние записи:
- "последние N записей" → SELECT id, timestamp, message_type, input_text, response_text FROM messages ORDER BY timestamp DESC LIMIT N
- "последнее сообщение" → SELECT id, timestamp, message_type, input_text, response_text FROM messages ORDER BY timestamp DESC LIMIT 1

Поиск по содержанию:
- "найди сообщения про [тема]" → SELECT id, timestamp, input_text FROM messages WHERE input_text LIKE '%тема%' LIMIT 10

Статистика по типам:
- "статистика по типам" → SELECT message_type, COUNT(*) as count FROM messages GROUP BY message_type

Временные запросы:
- "сегодняшние сообщения" → SELECT COUNT(*) as count FROM messages WHERE DATE(timestamp) = DATE('now')
- "за последний час" → SELECT COUNT(*) as count FROM messages WHERE timestamp >= datetime('now', '-1 hour')

ЗАПРОСЫ К ТАБЛИЦЕ МЫСЛЕЙ (thoughts):

Подсчет мыслей:
- "сколько мыслей" → SELECT COUNT(*) as count FROM thoughts
- "сколько мыслей по категории [название]" → SELECT COUNT(*) as count FROM thoughts WHERE category='название'

Последние мысли:
- "последние N мыслей" → SELECT id, timestamp, thought_text, category FROM thoughts ORDER BY timestamp DESC LIMIT N
- "последняя мысль" → SELECT id, timestamp, thought_text, category FROM thoughts ORDER BY timestamp DESC LIMIT 1

Поиск мыслей:
- "найди мысли про [тема]" → SELECT id, timestamp, thought_text FROM thoughts WHERE thought_text LIKE '%тема%' LIMIT 10

Мысли по категориям:
- "покажи все категории мыслей" → SELECT DISTINCT category FROM thoughts WHERE category IS NOT NULL
- "мысли категории [название]" → SELECT id, timestamp, thought_text FROM thoughts WHERE category='название' LIMIT 10"#;

/// Remove a surrounding markdown fence (```` ```sql ```` or bare ```` ``` ````).
pub fn strip_code_fence(raw: &str) -> String {
    let text = raw.trim();
    let text = text
        .strip_prefix("```sql")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim().to_string()
}

pub struct QueryTranslator {
    provider: Arc<dyn ModelProvider>,
    model: String,
}

impl QueryTranslator {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// One model call, no retries.
    pub async fn translate(&self, question: &str) -> Result<TranslatedQuery, QueryError> {
        info!(question, "Generating SQL");

        let raw = complete(self.provider.as_ref(), &self.model, SQL_SYSTEM_PROMPT, question)
            .await
            .map_err(|e| QueryError::Translation(describe_error(&e)))?;

        let sql = strip_code_fence(&raw);
        if sql.is_empty() {
            return Err(QueryError::Translation("модель не вернула SQL запрос".to_string()));
        }

        info!(sql = %sql, "SQL generated");
        Ok(TranslatedQuery::new(sql))
    }
}
