//! Configuration types.

use std::time::Duration;

/// Integration connector configuration.
///
/// Timeouts are client-enforced wall-clock deadlines, independent of any
/// server-side limit.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    /// Display name of the integration (used in notifications and logs).
    pub integration: String,
    /// Deadline for a single status check.
    pub status_timeout: Duration,
    /// Deadline for requesting the authorization URL.
    pub connect_timeout: Duration,
    /// Deadline for a disconnect request.
    pub disconnect_timeout: Duration,
    /// Wait after a successful OAuth callback before re-checking status.
    ///
    /// The backend gives no "processing complete" signal, so this is a
    /// polling heuristic, not a synchronization guarantee.
    pub callback_grace: Duration,
    /// Origins an authorization URL may point at. A URL whose origin is not
    /// in this list is never navigated to.
    pub allowed_provider_origins: Vec<String>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            integration: "Mailbox".to_string(),
            status_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(15),
            disconnect_timeout: Duration::from_secs(10),
            callback_grace: Duration::from_secs(1),
            allowed_provider_origins: vec!["https://accounts.google.com".to_string()],
        }
    }
}
