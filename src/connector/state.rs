//! Connection lifecycle state machine.

use serde::{Deserialize, Serialize};

/// State of the integration connection.
///
/// `Connected` and `Disconnected` are stable rest states; `Error` is
/// recoverable through a user-initiated re-check. Nothing is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Nothing known yet; no status check has run.
    Unknown,
    /// A status check is in flight.
    Checking,
    /// The remote integration is linked and usable.
    Connected,
    /// No integration linked.
    Disconnected,
    /// The last operation failed; waiting for the user to retry.
    Error,
    /// Requesting an authorization URL from the backend.
    Connecting,
    /// Browser handed off to the provider; waiting for the callback.
    AwaitingCallback,
    /// A disconnect request is in flight.
    Disconnecting,
}

impl ConnectionState {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, target),
            (Unknown, Checking)
                // A status check settles into one of the rest states.
                | (Checking, Connected) | (Checking, Disconnected) | (Checking, Error)
                // Rest states allow a refresh / user-initiated retry.
                | (Connected, Checking) | (Disconnected, Checking) | (Error, Checking)
                // Connect is only reachable from Disconnected or Error.
                | (Disconnected, Connecting) | (Error, Connecting)
                | (Connecting, AwaitingCallback) | (Connecting, Error)
                // The callback either re-checks status or reports failure.
                | (AwaitingCallback, Checking) | (AwaitingCallback, Error)
                | (Connected, Disconnecting)
                // Disconnect settles optimistically, or reverts on failure.
                | (Disconnecting, Disconnected) | (Disconnecting, Connected)
        )
    }

    /// Whether this is a stable rest state (no operation in flight).
    pub fn is_rest(&self) -> bool {
        matches!(self, Self::Connected | Self::Disconnected | Self::Error)
    }

    /// Whether an operation is currently in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Checking | Self::Connecting | Self::AwaitingCallback | Self::Disconnecting
        )
    }

    /// Whether `connect` may be invoked from this state.
    pub fn can_connect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Error)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Checking => "checking",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
            Self::Connecting => "connecting",
            Self::AwaitingCallback => "awaiting_callback",
            Self::Disconnecting => "disconnecting",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ConnectionState; 8] = [
        ConnectionState::Unknown,
        ConnectionState::Checking,
        ConnectionState::Connected,
        ConnectionState::Disconnected,
        ConnectionState::Error,
        ConnectionState::Connecting,
        ConnectionState::AwaitingCallback,
        ConnectionState::Disconnecting,
    ];

    #[test]
    fn valid_transitions() {
        use ConnectionState::*;
        let transitions = [
            (Unknown, Checking),
            (Checking, Connected),
            (Checking, Disconnected),
            (Checking, Error),
            (Connected, Checking),
            (Disconnected, Checking),
            (Error, Checking),
            (Disconnected, Connecting),
            (Error, Connecting),
            (Connecting, AwaitingCallback),
            (Connecting, Error),
            (AwaitingCallback, Checking),
            (AwaitingCallback, Error),
            (Connected, Disconnecting),
            (Disconnecting, Disconnected),
            (Disconnecting, Connected),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use ConnectionState::*;
        // Connect never starts from Connected or mid-flight states.
        assert!(!Connected.can_transition_to(Connecting));
        assert!(!Checking.can_transition_to(Connecting));
        assert!(!AwaitingCallback.can_transition_to(Connecting));
        // Disconnect requires a live connection.
        assert!(!Disconnected.can_transition_to(Disconnecting));
        assert!(!Error.can_transition_to(Disconnecting));
        // The hand-off cannot be skipped.
        assert!(!Disconnected.can_transition_to(AwaitingCallback));
        assert!(!Unknown.can_transition_to(Connected));
        // Self-transitions are not a thing.
        for state in ALL {
            assert!(!state.can_transition_to(state), "{state} self-transition");
        }
    }

    #[test]
    fn rest_and_busy_partition() {
        for state in ALL {
            if state == ConnectionState::Unknown {
                assert!(!state.is_rest() && !state.is_busy());
            } else {
                assert_ne!(state.is_rest(), state.is_busy(), "{state}");
            }
        }
    }

    #[test]
    fn connect_preconditions() {
        use ConnectionState::*;
        assert!(Disconnected.can_connect());
        assert!(Error.can_connect());
        for state in [Unknown, Checking, Connected, Connecting, AwaitingCallback, Disconnecting] {
            assert!(!state.can_connect(), "{state} must not allow connect");
        }
    }

    #[test]
    fn display_matches_serde() {
        for state in ALL {
            let display = format!("{state}");
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
