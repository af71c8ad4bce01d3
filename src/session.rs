//! Session types and the read-only session store interface.
//!
//! The session is owned by the host shell (login/logout/onboarding flows
//! mutate it there). This core only ever reads a snapshot of it, so both the
//! navigation guard and the integration connector stay independently testable
//! with fabricated sessions.

use serde::Serialize;

/// The signed-in user as the dashboard shell knows them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub onboarding_completed: bool,
}

impl User {
    pub fn new(id: impl Into<String>, onboarding_completed: bool) -> Self {
        Self {
            id: id.into(),
            onboarding_completed,
        }
    }
}

/// Authentication state shared read-only by both orchestrator components.
///
/// Fields are private so the invariant `!is_authenticated ⇒ user is None`
/// holds by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    is_authenticated: bool,
    user: Option<User>,
}

impl Session {
    /// A signed-out session.
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            user: None,
        }
    }

    /// A signed-in session for `user`.
    pub fn authenticated(user: User) -> Self {
        Self {
            is_authenticated: true,
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Whether the signed-in user has finished onboarding. Always false for
    /// anonymous sessions.
    pub fn onboarding_completed(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.onboarding_completed)
    }
}

/// The session as seen at one instant.
///
/// `Loading` means the shell has not resolved the session yet (e.g. a token
/// refresh is in flight); the guard reports `Pending` for it rather than
/// guessing, so protected content never flashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionSnapshot {
    Loading,
    Ready(Session),
}

impl SessionSnapshot {
    pub fn ready(session: Session) -> Self {
        Self::Ready(session)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Loading => None,
            Self::Ready(session) => Some(session),
        }
    }
}

/// Read-only view of the host-owned session.
///
/// Session mutation is a discrete host-side event: after login, logout, or
/// onboarding completion the host re-reads the snapshot and re-evaluates
/// navigation. Nothing in this core polls it.
pub trait SessionStore: Send + Sync {
    fn snapshot(&self) -> SessionSnapshot;
}

/// A session store holding a fixed snapshot. Useful for hosts with externally
/// managed sessions and for tests.
#[derive(Debug, Clone)]
pub struct StaticSessionStore {
    snapshot: SessionSnapshot,
}

impl StaticSessionStore {
    pub fn new(snapshot: SessionSnapshot) -> Self {
        Self { snapshot }
    }
}

impl SessionStore for StaticSessionStore {
    fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_user() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert!(!session.onboarding_completed());
    }

    #[test]
    fn authenticated_exposes_user() {
        let session = Session::authenticated(User::new("u-1", true));
        assert!(session.is_authenticated());
        assert_eq!(session.user().unwrap().id, "u-1");
        assert!(session.onboarding_completed());
    }

    #[test]
    fn onboarding_incomplete() {
        let session = Session::authenticated(User::new("u-2", false));
        assert!(session.is_authenticated());
        assert!(!session.onboarding_completed());
    }

    #[test]
    fn snapshot_session_accessor() {
        assert!(SessionSnapshot::Loading.session().is_none());
        let snapshot = SessionSnapshot::ready(Session::anonymous());
        assert!(snapshot.session().is_some());
    }

    #[test]
    fn static_store_returns_snapshot() {
        let store = StaticSessionStore::new(SessionSnapshot::ready(Session::authenticated(
            User::new("u-3", true),
        )));
        match store.snapshot() {
            SessionSnapshot::Ready(session) => assert_eq!(session.user().unwrap().id, "u-3"),
            SessionSnapshot::Loading => panic!("expected ready snapshot"),
        }
    }
}
