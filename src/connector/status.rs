//! Cached connection status — a snapshot of remote truth.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::ConnectionState;

/// What the backend reports about the integration link.
///
/// The remote API is the source of truth; this is a cache, valid until the
/// next explicit refresh (mount, callback, disconnect).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    /// Identifier of the linked account, e.g. the connected email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_identifier: Option<String>,
    /// Granted permission scopes.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub scopes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Server-reported problem with the link, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    /// Status for an account with no integration linked.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            account_identifier: None,
            scopes: BTreeSet::new(),
            last_sync_at: None,
            error: None,
        }
    }

    /// The rest state this status implies.
    pub fn rest_state(&self) -> ConnectionState {
        if self.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}
