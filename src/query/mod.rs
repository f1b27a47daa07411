//! Natural-language questions answered from the interaction log.
//!
//! Three steps, each a separate failure point: [`QueryTranslator`] asks the
//! model for one read-only statement, [`QueryExecutor`] guards and runs it,
//! [`AnswerCompressor`] turns the rendered rows into a short spoken answer.

mod compressor;
mod executor;
mod translator;

use std::fmt;

use thiserror::Error;

pub use compressor::AnswerCompressor;
pub use executor::{is_read_only, QueryExecutor, RenderedRows, NO_RESULTS};
pub use translator::{strip_code_fence, QueryTranslator};

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("ошибка генерации SQL: {0}")]
    Translation(String),

    #[error("разрешены только SELECT запросы")]
    NotReadOnly,

    #[error("ошибка выполнения SQL: {0}")]
    Execution(String),

    #[error("ошибка форматирования ответа: {0}")]
    Compression(String),
}

impl QueryError {
    /// The reply shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            QueryError::Translation(_) => format!("❌ Ошибка генерации SQL: {}", self),
            QueryError::NotReadOnly | QueryError::Execution(_) => {
                format!("❌ Ошибка выполнения запроса: {}", self)
            }
            QueryError::Compression(_) => format!("❌ Ошибка форматирования: {}", self),
        }
    }
}

/// A candidate statement produced by the model. Not trusted until
/// [`QueryExecutor::execute`] has checked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedQuery(String);

impl TranslatedQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TranslatedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
