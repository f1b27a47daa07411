use super::*;

use crate::traits::InteractionStore;
use crate::types::InteractionRecord;
#[cfg(test)]
use crate::types::MessageKind;

#[async_trait]
impl InteractionStore for SqliteStateStore {
    async fn append_interaction(&self, record: &InteractionRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO messages
                (timestamp, user_id, username, message_type, input_text, response_type, response_text)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(format_timestamp(&record.timestamp))
        .bind(record.user_id)
        .bind(&record.username)
        .bind(record.input_kind.as_str())
        .bind(&record.input_text)
        .bind(record.output_kind.as_str())
        .bind(&record.output_text)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
impl SqliteStateStore {
    /// Most recent records first.
    pub async fn recent_interactions(&self, limit: i64) -> anyhow::Result<Vec<InteractionRecord>> {
        let rows = sqlx::query(
            "SELECT timestamp, user_id, username, message_type, input_text, response_type, response_text
             FROM messages
             ORDER BY timestamp DESC, id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw_ts: String = row.get("timestamp");
            let input_kind: String = row.get("message_type");
            let output_kind: String = row.get("response_type");
            records.push(InteractionRecord {
                timestamp: parse_timestamp(&raw_ts).unwrap_or_else(Utc::now),
                user_id: row.get("user_id"),
                username: row.get::<Option<String>, _>("username").unwrap_or_default(),
                input_kind: MessageKind::parse(&input_kind).unwrap_or(MessageKind::Text),
                input_text: row.get::<Option<String>, _>("input_text").unwrap_or_default(),
                output_kind: MessageKind::parse(&output_kind).unwrap_or(MessageKind::Voice),
                output_text: row
                    .get::<Option<String>, _>("response_text")
                    .unwrap_or_default(),
            });
        }
        Ok(records)
    }
}
