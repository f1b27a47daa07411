use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{info, warn};

use super::{QueryError, TranslatedQuery};
use crate::traits::{QueryRows, QueryStore};

/// Rendered in place of an empty result so the compressor always has text.
pub const NO_RESULTS: &str = "Запрос выполнен успешно, но результатов не найдено.";

/// Textual summary of a result set, ready for the compression prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRows {
    pub row_count: usize,
    pub text: String,
}

/// The read-only guard: trimmed, upper-cased text must start with `SELECT`.
///
/// A leading comment fails this check. A comment after `SELECT`, or a second
/// statement after a semicolon, does not; the store runs queries on a
/// read-only connection to cover that.
pub fn is_read_only(sql: &str) -> bool {
    sql.trim().to_uppercase().starts_with("SELECT")
}

fn render(rows: &QueryRows) -> RenderedRows {
    if rows.rows.is_empty() {
        return RenderedRows {
            row_count: 0,
            text: NO_RESULTS.to_string(),
        };
    }

    let mut text = format!("Найдено записей: {}\n\n", rows.rows.len());
    for (i, row) in rows.rows.iter().enumerate() {
        let _ = writeln!(text, "Запись {}:", i + 1);
        for (column, value) in rows.columns.iter().zip(row) {
            let _ = writeln!(text, "  {}: {}", column, value);
        }
        text.push('\n');
    }

    RenderedRows {
        row_count: rows.rows.len(),
        text,
    }
}

pub struct QueryExecutor {
    store: Arc<dyn QueryStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn QueryStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, query: &TranslatedQuery) -> Result<RenderedRows, QueryError> {
        if !is_read_only(query.as_str()) {
            warn!(sql = %query, "Rejected non-SELECT query");
            return Err(QueryError::NotReadOnly);
        }

        let rows = self
            .store
            .run_read_query(query.as_str())
            .await
            .map_err(|e| QueryError::Execution(e.to_string()))?;

        let rendered = render(&rows);
        info!(rows = rendered.row_count, "SQL executed");
        Ok(rendered)
    }
}
