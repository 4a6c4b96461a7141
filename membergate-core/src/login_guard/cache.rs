use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Failed attempts recorded within one session scope.
#[derive(Clone, Debug, Default)]
struct AttemptScope {
    attempts: HashMap<String, Vec<DateTime<Utc>>>,
    last_seen: Option<DateTime<Utc>>,
}

/// What the guard needs to know after recording an attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptSnapshot {
    pub total_attempts: usize,
    pub distinct_identifiers: usize,
}

/// In-memory map of session scope -> identifier -> attempt timestamps.
/// Never persisted; a lock is the only durable outcome.
pub struct LoginAttemptCache {
    scopes: RwLock<HashMap<Uuid, AttemptScope>>,
}

impl LoginAttemptCache {
    pub fn new() -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
        }
    }

    /// Record one failed attempt and report the scope's totals.
    pub async fn record_attempt(&self, scope_id: Uuid, identifier: &str) -> AttemptSnapshot {
        let now = Utc::now();
        let mut scopes = self.scopes.write().await;
        let scope = scopes.entry(scope_id).or_default();
        scope.last_seen = Some(now);
        scope
            .attempts
            .entry(identifier.to_owned())
            .or_default()
            .push(now);

        AttemptSnapshot {
            total_attempts: scope.attempts.values().map(Vec::len).sum(),
            distinct_identifiers: scope.attempts.len(),
        }
    }

    /// Clear a scope's counters, on successful login and on lock.
    pub async fn clear_scope(&self, scope_id: Uuid) {
        let mut scopes = self.scopes.write().await;
        scopes.remove(&scope_id);
    }

    /// Drop scopes that have been idle longer than the session lifetime.
    pub async fn vacuum(&self, max_idle: Duration) {
        let cutoff = Utc::now() - chrono::Duration::from_std(max_idle).unwrap_or_default();
        let mut scopes = self.scopes.write().await;
        scopes.retain(|_, scope| scope.last_seen.map(|t| t > cutoff).unwrap_or(false));
    }

    #[cfg(test)]
    pub async fn scope_count(&self) -> usize {
        self.scopes.read().await.len()
    }
}

impl Default for LoginAttemptCache {
    fn default() -> Self {
        Self::new()
    }
}
