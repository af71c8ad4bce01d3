//! OAuth callback detection — parse-once semantics for the return query.
//!
//! The provider sends the browser back with `oauth_success=true` or
//! `oauth_error=<url-encoded message>` in the query string. Hosts re-render
//! freely (React-style double invocation included), so consumption is guarded
//! by a one-shot flag that lives outside the observable state.

use std::sync::atomic::{AtomicBool, Ordering};

/// What the provider put in the return URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Success,
    /// Decoded error message from the provider.
    Error(String),
}

/// Parse a raw query string (leading `?` tolerated) for the OAuth callback
/// indicators. Returns `None` when neither is present.
pub fn parse_callback_query(query: &str) -> Option<CallbackOutcome> {
    let query = query.strip_prefix('?').unwrap_or(query);
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "oauth_success" if value == "true" => return Some(CallbackOutcome::Success),
            "oauth_error" => return Some(CallbackOutcome::Error(value.into_owned())),
            _ => {}
        }
    }
    None
}

/// One-shot guard: consumed at most once per OAuth flow.
///
/// Armed on construction and re-armed by each `connect`, so a repeated
/// invocation with the same query string (re-render before the URL is
/// cleaned) is a no-op.
#[derive(Debug)]
pub struct CallbackGuard {
    handled: AtomicBool,
}

impl CallbackGuard {
    pub fn new() -> Self {
        Self {
            handled: AtomicBool::new(false),
        }
    }

    /// Re-arm for a new OAuth flow.
    pub fn arm(&self) {
        self.handled.store(false, Ordering::SeqCst);
    }

    /// Returns true exactly once per armed flow.
    pub fn try_consume(&self) -> bool {
        !self.handled.swap(true, Ordering::SeqCst)
    }
}

impl Default for CallbackGuard {
    fn default() -> Self {
        Self::new()
    }
}
