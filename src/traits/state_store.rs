use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{InteractionRecord, NoteRecord};

/// Limits applied by [`QuotaStore::consume_quota`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub daily_limit: u32,
    /// When set, a user's very first request creates their row without
    /// counting against the limit.
    pub first_contact_free: bool,
}

/// Per-user daily quota storage.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Atomically consume one unit of `user_id`'s quota for `today`.
    ///
    /// Rolls the window over when the stored date differs from `today`.
    /// Returns the count after consumption, or `None` if the user already
    /// reached the limit for `today` (in which case nothing was written).
    async fn consume_quota(
        &self,
        user_id: i64,
        username: &str,
        today: NaiveDate,
        policy: QuotaPolicy,
    ) -> anyhow::Result<Option<u32>>;
}

/// Append-only log of delivered exchanges.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn append_interaction(&self, record: &InteractionRecord) -> anyhow::Result<()>;
}

/// Append-only note storage.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn save_note(&self, note: &NoteRecord) -> anyhow::Result<()>;
}

/// Raw result of an ad-hoc read query, every value already rendered as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Runs ad-hoc read queries against the structured store.
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// Execute `sql` with writes disabled. No partial results on error.
    async fn run_read_query(&self, sql: &str) -> anyhow::Result<QueryRows>;
}
