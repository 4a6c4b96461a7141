use membergate_core::SessionInfo;
use poem::session::Session;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub static SESSION_COOKIE_NAME: &str = "membergate-session";

static AUTH_SESSION_KEY: &str = "auth";
static TWO_FACTOR_SESSION_KEY: &str = "two_factor";
static DELETION_MARKER_KEY: &str = "deletion_marker";
static ATTEMPT_SCOPE_KEY: &str = "attempt_scope_id";
static CAME_FROM_KEY: &str = "came_from";

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct SessionAuthorization {
    pub account_id: Uuid,
    pub username: String,
}

/// The two-factor handle stashed in the HTTP session while the emailed code
/// is outstanding.
#[derive(Clone, Serialize, Deserialize)]
pub struct TwoFactorHandle {
    pub state_id: Uuid,
    pub session_key: String,
}

impl From<&SessionInfo> for TwoFactorHandle {
    fn from(info: &SessionInfo) -> Self {
        TwoFactorHandle {
            state_id: info.state_id,
            session_key: info.session_key.expose_secret().clone(),
        }
    }
}

pub trait SessionExt {
    fn get_auth(&self) -> Option<SessionAuthorization>;
    fn set_auth(&self, auth: SessionAuthorization);
    fn is_authenticated(&self) -> bool;
    fn get_username(&self) -> Option<String>;

    fn get_two_factor(&self) -> Option<TwoFactorHandle>;
    fn set_two_factor(&self, handle: TwoFactorHandle);
    fn clear_two_factor(&self);

    fn get_deletion_marker(&self) -> Option<String>;
    fn set_deletion_marker(&self, query: String);
    fn take_deletion_marker(&self) -> Option<String>;

    fn get_came_from(&self) -> Option<String>;
    fn set_came_from(&self, url: String);

    /// Stable id scoping the failed-login attempt map to this session.
    fn attempt_scope_id(&self) -> Uuid;
}

impl SessionExt for Session {
    fn get_auth(&self) -> Option<SessionAuthorization> {
        self.get(AUTH_SESSION_KEY)
    }

    fn set_auth(&self, auth: SessionAuthorization) {
        self.set(AUTH_SESSION_KEY, auth);
    }

    fn is_authenticated(&self) -> bool {
        self.get_auth().is_some()
    }

    fn get_username(&self) -> Option<String> {
        self.get_auth().map(|x| x.username)
    }

    fn get_two_factor(&self) -> Option<TwoFactorHandle> {
        self.get(TWO_FACTOR_SESSION_KEY)
    }

    fn set_two_factor(&self, handle: TwoFactorHandle) {
        self.set(TWO_FACTOR_SESSION_KEY, handle);
    }

    fn clear_two_factor(&self) {
        self.remove(TWO_FACTOR_SESSION_KEY)
    }

    fn get_deletion_marker(&self) -> Option<String> {
        self.get(DELETION_MARKER_KEY)
    }

    fn set_deletion_marker(&self, query: String) {
        self.set(DELETION_MARKER_KEY, query);
    }

    fn take_deletion_marker(&self) -> Option<String> {
        let marker = self.get_deletion_marker();
        if marker.is_some() {
            self.remove(DELETION_MARKER_KEY);
        }
        marker
    }

    fn get_came_from(&self) -> Option<String> {
        self.get(CAME_FROM_KEY)
    }

    fn set_came_from(&self, url: String) {
        self.set(CAME_FROM_KEY, url);
    }

    fn attempt_scope_id(&self) -> Uuid {
        match self.get(ATTEMPT_SCOPE_KEY) {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4();
                self.set(ATTEMPT_SCOPE_KEY, id);
                id
            }
        }
    }
}
