use super::*;

use crate::traits::{QuotaPolicy, QuotaStore};
#[cfg(test)]
use crate::types::UserQuota;

#[async_trait]
impl QuotaStore for SqliteStateStore {
    async fn consume_quota(
        &self,
        user_id: i64,
        username: &str,
        today: NaiveDate,
        policy: QuotaPolicy,
    ) -> anyhow::Result<Option<u32>> {
        let today = today.format(DATE_FORMAT).to_string();
        let initial_count: i64 = if policy.first_contact_free { 0 } else { 1 };

        // One statement: insert a fresh row, roll a stale window over, or
        // increment while under the limit. When the WHERE rejects the update
        // nothing is written and RETURNING yields no row.
        let row = sqlx::query(
            "INSERT INTO user_limits (user_id, username, date, request_count)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                request_count = CASE
                    WHEN user_limits.date = excluded.date THEN user_limits.request_count + 1
                    ELSE 1
                END,
                date = excluded.date
             WHERE user_limits.date IS NOT excluded.date
                OR user_limits.request_count < ?
             RETURNING request_count",
        )
        .bind(user_id)
        .bind(username)
        .bind(&today)
        .bind(initial_count)
        .bind(i64::from(policy.daily_limit))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get::<i64, _>("request_count").max(0) as u32))
    }
}

#[cfg(test)]
impl SqliteStateStore {
    pub async fn get_quota(&self, user_id: i64) -> anyhow::Result<Option<UserQuota>> {
        let row = sqlx::query(
            "SELECT user_id, username, date, request_count FROM user_limits WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw_date: String = row.get("date");
        let window = parse_window_date(&raw_date)
            .ok_or_else(|| anyhow::anyhow!("Invalid quota window date: {}", raw_date))?;

        Ok(Some(UserQuota {
            user_id: row.get("user_id"),
            username: row.get::<Option<String>, _>("username").unwrap_or_default(),
            window,
            count: row.get::<i64, _>("request_count").max(0) as u32,
        }))
    }
}
