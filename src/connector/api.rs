//! Consumed interfaces: the remote integration API and the host ports.
//!
//! Everything the connector talks to comes in through these traits, so the
//! lifecycle logic is testable with in-memory fakes and the host decides how
//! navigation, confirmation dialogs, and HTTP actually happen.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ApiError;

use super::status::ConnectionStatus;

/// Authorization hand-off returned by `start_oauth`.
///
/// The URL is untrusted until the connector has validated its origin against
/// the provider allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthStart {
    pub authorization_url: String,
}

/// Result of a disconnect request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The remote integration API.
///
/// Implementations report transport-level failures only; deadlines are
/// enforced by the connector around every call.
#[async_trait]
pub trait IntegrationApi: Send + Sync {
    /// Fetch the current connection status for `user_id`.
    async fn get_connection_status(&self, user_id: &str) -> Result<ConnectionStatus, ApiError>;

    /// Begin the OAuth hand-off. `redirect_target` is the same-origin path
    /// the provider should send the user back to.
    async fn start_oauth(&self, redirect_target: &str) -> Result<OAuthStart, ApiError>;

    /// Tear down the integration server-side.
    async fn disconnect_integration(&self, user_id: &str) -> Result<DisconnectOutcome, ApiError>;
}

/// Host browser port.
pub trait Browser: Send + Sync {
    /// Navigate the browser to the provider's authorization page. Only ever
    /// called with a URL that passed origin validation.
    fn open_external(&self, url: &Url);

    /// Strip the OAuth callback parameters from the current URL so
    /// back-navigation and re-renders cannot re-trigger the callback.
    fn clear_callback_params(&self);
}

/// Blocking yes/no prompt for destructive actions (disconnect).
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, title: &str, message: &str) -> bool;
}
