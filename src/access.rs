//! Per-user daily quota gate.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::config::AccessConfig;
use crate::traits::{QuotaPolicy, QuotaStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The sender already used `limit` requests in the current window.
    QuotaExhausted { limit: u32 },
    /// The quota store failed and the gate is configured to fail closed.
    StoreUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Denied(DenyReason),
}

pub struct AccessController {
    store: Arc<dyn QuotaStore>,
    owner_username: String,
    policy: QuotaPolicy,
    fail_open: bool,
}

impl AccessController {
    pub fn new(store: Arc<dyn QuotaStore>, config: &AccessConfig) -> Self {
        Self {
            store,
            owner_username: config.owner_username.trim_start_matches('@').to_string(),
            policy: QuotaPolicy {
                daily_limit: config.daily_limit,
                first_contact_free: config.first_contact_free,
            },
            fail_open: config.fail_open,
        }
    }

    /// Whether `username` is the privileged identity. An unset owner matches nobody.
    pub fn is_owner(&self, username: &str) -> bool {
        !self.owner_username.is_empty() && username == self.owner_username
    }

    pub fn daily_limit(&self) -> u32 {
        self.policy.daily_limit
    }

    /// Gate one request against today's (server-local) window.
    pub async fn check_and_consume(&self, user_id: i64, username: &str) -> AccessDecision {
        let today = chrono::Local::now().date_naive();
        self.check_and_consume_on(user_id, username, today).await
    }

    pub async fn check_and_consume_on(
        &self,
        user_id: i64,
        username: &str,
        today: NaiveDate,
    ) -> AccessDecision {
        if self.is_owner(username) {
            return AccessDecision::Allowed;
        }

        match self
            .store
            .consume_quota(user_id, username, today, self.policy)
            .await
        {
            Ok(Some(count)) => {
                info!(user_id, username, count, limit = self.policy.daily_limit, "Quota consumed");
                AccessDecision::Allowed
            }
            Ok(None) => {
                info!(user_id, username, "Request rejected: daily limit reached");
                AccessDecision::Denied(DenyReason::QuotaExhausted {
                    limit: self.policy.daily_limit,
                })
            }
            Err(e) if self.fail_open => {
                warn!(user_id, error = %e, "Quota store failed; allowing request");
                AccessDecision::Allowed
            }
            Err(e) => {
                error!(user_id, error = %e, "Quota store failed; denying request");
                AccessDecision::Denied(DenyReason::StoreUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SqliteStateStore;
    use crate::testing::FailingQuotaStore;

    fn access_config(fail_open: bool, first_contact_free: bool) -> AccessConfig {
        AccessConfig {
            owner_username: "owner".to_string(),
            daily_limit: 2,
            fail_open,
            first_contact_free,
        }
    }

    async fn sqlite_controller(
        config: &AccessConfig,
    ) -> (AccessController, Arc<SqliteStateStore>, tempfile::NamedTempFile) {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let store = Arc::new(
            SqliteStateStore::new(db_file.path().to_str().unwrap())
                .await
                .unwrap(),
        );
        let controller = AccessController::new(store.clone(), config);
        (controller, store, db_file)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[tokio::test]
    async fn test_third_request_in_window_denied() {
        let (gate, _store, _db) = sqlite_controller(&access_config(true, false)).await;

        assert_eq!(gate.check_and_consume_on(1, "bob", day(4)).await, AccessDecision::Allowed);
        assert_eq!(gate.check_and_consume_on(1, "bob", day(4)).await, AccessDecision::Allowed);
        assert_eq!(
            gate.check_and_consume_on(1, "bob", day(4)).await,
            AccessDecision::Denied(DenyReason::QuotaExhausted { limit: 2 })
        );
    }

    #[tokio::test]
    async fn test_new_window_resets_count() {
        let (gate, store, _db) = sqlite_controller(&access_config(true, false)).await;

        gate.check_and_consume_on(1, "bob", day(4)).await;
        gate.check_and_consume_on(1, "bob", day(4)).await;
        assert_eq!(gate.check_and_consume_on(1, "bob", day(5)).await, AccessDecision::Allowed);

        let quota = store.get_quota(1).await.unwrap().unwrap();
        assert_eq!(quota.window, day(5));
        assert_eq!(quota.count, 1);
    }

    #[tokio::test]
    async fn test_owner_bypasses_without_row() {
        let (gate, store, _db) = sqlite_controller(&access_config(true, false)).await;

        for _ in 0..5 {
            assert_eq!(
                gate.check_and_consume_on(99, "owner", day(4)).await,
                AccessDecision::Allowed
            );
        }
        assert!(store.get_quota(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_owner_matches_nobody() {
        let mut config = access_config(true, false);
        config.owner_username = String::new();
        let (gate, store, _db) = sqlite_controller(&config).await;

        assert!(!gate.is_owner(""));
        gate.check_and_consume_on(3, "", day(4)).await;
        assert!(store.get_quota(3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_owner_configured_with_at_sign() {
        let mut config = access_config(true, false);
        config.owner_username = "@owner".to_string();
        let (gate, _store, _db) = sqlite_controller(&config).await;
        assert!(gate.is_owner("owner"));
    }

    #[tokio::test]
    async fn test_first_contact_free_grants_extra_request() {
        let (gate, _store, _db) = sqlite_controller(&access_config(true, true)).await;

        for _ in 0..3 {
            assert_eq!(gate.check_and_consume_on(1, "bob", day(4)).await, AccessDecision::Allowed);
        }
        assert!(matches!(
            gate.check_and_consume_on(1, "bob", day(4)).await,
            AccessDecision::Denied(DenyReason::QuotaExhausted { .. })
        ));
    }

    #[tokio::test]
    async fn test_first_contact_counts_by_default() {
        let (gate, store, _db) = sqlite_controller(&access_config(true, false)).await;
        gate.check_and_consume_on(1, "bob", day(4)).await;
        assert_eq!(store.get_quota(1).await.unwrap().unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_store_failure_fail_open_allows() {
        let gate = AccessController::new(Arc::new(FailingQuotaStore), &access_config(true, false));
        assert_eq!(gate.check_and_consume_on(1, "bob", day(4)).await, AccessDecision::Allowed);
    }

    #[tokio::test]
    async fn test_store_failure_fail_closed_denies() {
        let gate = AccessController::new(Arc::new(FailingQuotaStore), &access_config(false, false));
        assert_eq!(
            gate.check_and_consume_on(1, "bob", day(4)).await,
            AccessDecision::Denied(DenyReason::StoreUnavailable)
        );
    }

    #[tokio::test]
    async fn test_owner_allowed_even_when_store_down() {
        let gate = AccessController::new(Arc::new(FailingQuotaStore), &access_config(false, false));
        assert_eq!(gate.check_and_consume_on(1, "owner", day(4)).await, AccessDecision::Allowed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_never_exceed_limit() {
        // Fail closed so a lost race would show up as a denial, not a pass.
        let (gate, store, _db) = sqlite_controller(&access_config(false, false)).await;
        let gate = Arc::new(gate);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.check_and_consume_on(1, "bob", day(4)).await })
            })
            .collect();

        let mut allowed = 0;
        let mut exhausted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                AccessDecision::Allowed => allowed += 1,
                AccessDecision::Denied(DenyReason::QuotaExhausted { .. }) => exhausted += 1,
                other => panic!("unexpected decision: {:?}", other),
            }
        }

        assert_eq!(allowed, 2);
        assert_eq!(exhausted, 18);
        assert_eq!(store.get_quota(1).await.unwrap().unwrap().count, 2);
    }
}
