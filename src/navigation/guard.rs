//! Route guard — the single authority on whether a route may be shown.
//!
//! Evaluation is pure: same `(session, path, hint)` in, same decision out,
//! and re-evaluating at a redirect target yields `Allow`. The caller performs
//! the actual navigation and drops the hint once a redirect is followed.

use serde::Serialize;

use crate::session::{SessionSnapshot, SessionStore};

use super::policy::RoutePolicy;
use super::redirect::sanitize_redirect;

/// Outcome of evaluating one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum NavigationDecision {
    /// Render the requested path.
    Allow,
    /// Navigate to `target` instead of rendering.
    RedirectTo { target: String },
    /// Session still resolving — render a neutral loading state, nothing
    /// protected.
    Pending,
}

impl NavigationDecision {
    fn redirect(target: impl Into<String>) -> Self {
        Self::RedirectTo {
            target: target.into(),
        }
    }

    /// Redirect target, if this decision is a redirect.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::RedirectTo { target } => Some(target),
            _ => None,
        }
    }
}

/// Computes the authoritative destination for every `(session, path)` change.
#[derive(Debug, Clone, Default)]
pub struct NavigationGuard {
    policy: RoutePolicy,
}

impl NavigationGuard {
    pub fn new(policy: RoutePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Decide whether `path` may be shown for the current session.
    ///
    /// Rules are evaluated in strict priority order; the first match wins.
    /// A malformed `explicit_redirect` is treated as absent.
    pub fn evaluate(
        &self,
        snapshot: &SessionSnapshot,
        path: &str,
        explicit_redirect: Option<&str>,
    ) -> NavigationDecision {
        let session = match snapshot {
            SessionSnapshot::Loading => return NavigationDecision::Pending,
            SessionSnapshot::Ready(session) => session,
        };

        let policy = &self.policy;
        let hint = sanitize_redirect(explicit_redirect);
        let authenticated = session.is_authenticated();
        let onboarded = session.onboarding_completed();

        // 1. Guests never see protected routes.
        if policy.requires_auth(path) && !authenticated && !policy.is_auth_entry(path) {
            return NavigationDecision::redirect(policy.login_path.as_str());
        }

        // 2. Routes that demand a finished onboarding pull unfinished users in.
        if authenticated && !onboarded && policy.requires_onboarding(path) {
            return NavigationDecision::redirect(policy.onboarding_entry());
        }

        // 3. Signed-in users have no business on login/signup.
        if authenticated && policy.is_auth_entry(path) {
            let target = hint
                .filter(|t| *t != path)
                .unwrap_or(policy.home_path.as_str());
            return NavigationDecision::redirect(target);
        }

        // 4. Unfinished users outside the flow (and not on an exempt page)
        //    belong in onboarding.
        if authenticated
            && !onboarded
            && !policy.in_onboarding(path)
            && !policy.is_onboarding_exempt(path)
        {
            return NavigationDecision::redirect(policy.onboarding_entry());
        }

        // 5. Finished users don't revisit onboarding.
        if authenticated && onboarded && policy.in_onboarding(path) {
            return NavigationDecision::redirect(policy.home_path.as_str());
        }

        // 6. A pending hint is honored once nothing above objected.
        if let Some(target) = hint {
            if target != path && !policy.is_auth_entry(path) && !policy.in_onboarding(path) {
                return NavigationDecision::redirect(target);
            }
        }

        NavigationDecision::Allow
    }

    /// Convenience: read the current snapshot from `store` and evaluate.
    pub fn evaluate_from(
        &self,
        store: &dyn SessionStore,
        path: &str,
        explicit_redirect: Option<&str>,
    ) -> NavigationDecision {
        self.evaluate(&store.snapshot(), path, explicit_redirect)
    }
}
