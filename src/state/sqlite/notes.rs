use super::*;

use crate::traits::NoteStore;
use crate::types::NoteRecord;

#[async_trait]
impl NoteStore for SqliteStateStore {
    async fn save_note(&self, note: &NoteRecord) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO thoughts (timestamp, thought_text, category) VALUES (?, ?, ?)")
            .bind(format_timestamp(&note.timestamp))
            .bind(&note.text)
            .bind(&note.category)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
impl SqliteStateStore {
    /// Most recent notes first.
    pub async fn recent_notes(&self, limit: i64) -> anyhow::Result<Vec<NoteRecord>> {
        let rows = sqlx::query(
            "SELECT timestamp, thought_text, category FROM thoughts
             ORDER BY timestamp DESC, id DESC
             LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let raw_ts: String = row.get("timestamp");
                NoteRecord {
                    timestamp: parse_timestamp(&raw_ts).unwrap_or_else(Utc::now),
                    text: row.get("thought_text"),
                    category: row
                        .get::<Option<String>, _>("category")
                        .unwrap_or_default(),
                }
            })
            .collect())
    }
}
