mod provider;

pub use provider::{EmailTwoFactor, SessionInfo, TwoFactorProvider};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use membergate_common::{MembergateError, Secret};
use uuid::Uuid;

/// Server-side record bridging primary credential success and the secondary
/// code check.
pub struct TwoFactorState {
    pub id: Uuid,
    pub account_id: Uuid,
    pub session_key: Secret<String>,
    pub code: String,
    pub started: Instant,
}

impl TwoFactorState {
    pub fn new(account_id: Uuid, code: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            session_key: Secret::random(),
            code,
            started: Instant::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.started.elapsed() > ttl
    }
}

/// In-memory store of pending two-factor states, vacuumed periodically.
pub struct TwoFactorStore {
    states: HashMap<Uuid, TwoFactorState>,
    ttl: Duration,
}

impl TwoFactorStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            states: HashMap::new(),
            ttl,
        }
    }

    pub fn insert(&mut self, state: TwoFactorState) -> Uuid {
        let id = state.id;
        self.states.insert(id, state);
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&TwoFactorState> {
        self.states.get(id)
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<TwoFactorState> {
        self.states.remove(id)
    }

    pub fn vacuum(&mut self) {
        let ttl = self.ttl;
        self.states.retain(|_, state| !state.is_expired(ttl));
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TwoFactorOutcome {
    Authenticated(Uuid),
    /// Kept in the store so the user may retry; the failed attempt still
    /// feeds the login attempt guard.
    WrongCode,
}

/// Validate a two-factor submission, in fixed order: session key, expiry,
/// code. Key mismatch and expiry both reset the pending state; a wrong code
/// does not.
pub fn verify_two_factor(
    store: &mut TwoFactorStore,
    state_id: Uuid,
    submitted_key: &str,
    submitted_code: &str,
    already_authenticated: bool,
    ttl: Duration,
) -> Result<TwoFactorOutcome, MembergateError> {
    let Some(state) = store.get(&state_id) else {
        return Err(MembergateError::SessionInvalid);
    };

    if already_authenticated || state.session_key.expose_secret() != submitted_key {
        store.remove(&state_id);
        return Err(MembergateError::SessionInvalid);
    }

    if state.is_expired(ttl) {
        store.remove(&state_id);
        return Err(MembergateError::SessionExpired);
    }

    if state.code != submitted_code {
        return Ok(TwoFactorOutcome::WrongCode);
    }

    #[allow(clippy::unwrap_used)]
    let state = store.remove(&state_id).unwrap();
    Ok(TwoFactorOutcome::Authenticated(state.account_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(180);

    fn store_with_state() -> (TwoFactorStore, Uuid, String, Uuid) {
        let mut store = TwoFactorStore::new(TTL);
        let account_id = Uuid::new_v4();
        let state = TwoFactorState::new(account_id, "123456".to_owned());
        let key = state.session_key.expose_secret().clone();
        let id = store.insert(state);
        (store, id, key, account_id)
    }

    #[test]
    fn correct_code_authenticates_and_consumes_the_state() {
        let (mut store, id, key, account_id) = store_with_state();
        let outcome = verify_two_factor(&mut store, id, &key, "123456", false, TTL).unwrap();
        assert_eq!(outcome, TwoFactorOutcome::Authenticated(account_id));
        assert!(store.is_empty());
    }

    #[test]
    fn wrong_code_keeps_the_state_for_a_retry() {
        let (mut store, id, key, _) = store_with_state();
        let outcome = verify_two_factor(&mut store, id, &key, "654321", false, TTL).unwrap();
        assert_eq!(outcome, TwoFactorOutcome::WrongCode);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn key_mismatch_resets_the_state() {
        let (mut store, id, _, _) = store_with_state();
        let result = verify_two_factor(&mut store, id, "wrong-key", "123456", false, TTL);
        assert!(matches!(result, Err(MembergateError::SessionInvalid)));
        assert!(store.is_empty());
    }

    #[test]
    fn already_authenticated_session_is_rejected() {
        let (mut store, id, key, _) = store_with_state();
        let result = verify_two_factor(&mut store, id, &key, "123456", true, TTL);
        assert!(matches!(result, Err(MembergateError::SessionInvalid)));
        assert!(store.is_empty());
    }

    #[test]
    fn expiry_beats_the_wrong_code_check() {
        let (mut store, id, key, _) = store_with_state();
        let result = verify_two_factor(&mut store, id, &key, "654321", false, Duration::ZERO);
        assert!(matches!(result, Err(MembergateError::SessionExpired)));
        assert!(store.is_empty());
    }

    #[test]
    fn correct_code_after_expiry_still_expires() {
        let (mut store, id, key, _) = store_with_state();
        let result = verify_two_factor(&mut store, id, &key, "123456", false, Duration::ZERO);
        assert!(matches!(result, Err(MembergateError::SessionExpired)));
    }

    #[test]
    fn vacuum_only_discards_expired_states() {
        let mut store = TwoFactorStore::new(Duration::ZERO);
        store.insert(TwoFactorState::new(Uuid::new_v4(), "000000".to_owned()));
        store.vacuum();
        assert!(store.is_empty());

        let mut store = TwoFactorStore::new(TTL);
        store.insert(TwoFactorState::new(Uuid::new_v4(), "000000".to_owned()));
        store.vacuum();
        assert_eq!(store.len(), 1);
    }
}
