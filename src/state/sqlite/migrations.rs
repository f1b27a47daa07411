use sqlx::SqlitePool;

/// Create the schema. Idempotent; safe to run on every start.
pub(crate) async fn migrate_state(pool: &SqlitePool) -> anyhow::Result<()> {
    // Interaction history. Column names are part of the query prompt, keep them stable.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
            user_id INTEGER,
            username TEXT,
            message_type TEXT,
            input_text TEXT,
            response_type TEXT,
            response_text TEXT
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS thoughts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp DATETIME DEFAULT CURRENT_TIMESTAMP,
            thought_text TEXT NOT NULL,
            category TEXT
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS user_limits (
            user_id INTEGER PRIMARY KEY,
            username TEXT,
            date DATE DEFAULT (date('now')),
            request_count INTEGER DEFAULT 0
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_thoughts_timestamp ON thoughts(timestamp)")
        .execute(pool)
        .await?;

    Ok(())
}
