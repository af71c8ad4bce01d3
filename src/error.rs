//! Error types for the orchestrator core.

use std::time::Duration;

/// Top-level error type for the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("Integration API error: {0}")]
    Api(#[from] ApiError),
}

/// Errors surfaced by integration connector operations.
///
/// `Timeout`, `Network`, and `InvalidResponse` produce a user-facing
/// notification. `SecurityViolation` does too, and additionally short-circuits
/// before any browser navigation. `UserCancelled` and `InvalidState` are
/// silent: the first is a plain no-op, the second a caller bug.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Unexpected response from integration service: {0}")]
    InvalidResponse(String),

    #[error("Authorization URL rejected: {url} does not match a known provider origin")]
    SecurityViolation { url: String },

    #[error("Cancelled by user")]
    UserCancelled,

    #[error("Cannot {operation} while connection state is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },
}

impl ConnectorError {
    /// Whether this error should be surfaced to the user as a notification.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::UserCancelled | Self::InvalidState { .. })
    }

    /// Map a transport-level API failure into the connector taxonomy.
    pub(crate) fn from_api(err: ApiError) -> Self {
        match err {
            ApiError::Network(reason) => Self::Network(reason),
            ApiError::Status { status, body } => {
                Self::Network(format!("service returned {status}: {body}"))
            }
            ApiError::Malformed(reason) => Self::InvalidResponse(reason),
        }
    }
}

/// Transport-level failures from the remote integration API.
///
/// Deadlines are not part of this taxonomy: the connector enforces its own
/// wall-clock timeouts around every API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Integration service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response payload: {0}")]
    Malformed(String),
}

/// Result type alias for the orchestrator.
pub type Result<T> = std::result::Result<T, Error>;
