use super::*;

use sqlx::sqlite::SqliteRow;
use sqlx::{Column, TypeInfo, ValueRef};
use tracing::debug;

use crate::traits::{QueryRows, QueryStore};

#[async_trait]
impl QueryStore for SqliteStateStore {
    async fn run_read_query(&self, sql: &str) -> anyhow::Result<QueryRows> {
        // The read pool is opened read-only at the file level, so a batch such
        // as "SELECT 1; PRAGMA query_only = OFF; DELETE FROM thoughts" fails
        // on its first write instead of running.
        let fetched = sqlx::query(sql).fetch_all(&self.read_pool).await;
        if let Err(e) = &fetched {
            debug!(error = %e, "Read query failed");
        }

        let rows = fetched?;
        let Some(first) = rows.first() else {
            return Ok(QueryRows::default());
        };

        let columns: Vec<String> = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rendered = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(render_value(row, idx)?);
            }
            rendered.push(values);
        }

        Ok(QueryRows {
            columns,
            rows: rendered,
        })
    }
}

/// Coerce one cell to printable text. Byte strings are decoded as lossy UTF-8.
fn render_value(row: &SqliteRow, idx: usize) -> anyhow::Result<String> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok("NULL".to_string());
    }
    let is_blob = raw.type_info().name() == "BLOB";

    if is_blob {
        let bytes: Vec<u8> = row.try_get_unchecked(idx)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        // SQLite converts INTEGER and REAL to their text form on request.
        Ok(row.try_get_unchecked::<String, _>(idx)?)
    }
}
