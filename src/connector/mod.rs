//! Integration connection lifecycle.

pub mod api;
pub mod callback;
pub mod connector;
pub mod http;
pub mod state;
pub mod status;
pub mod target;

pub use api::{Browser, ConfirmationPrompt, DisconnectOutcome, IntegrationApi, OAuthStart};
pub use callback::{CallbackGuard, CallbackOutcome, parse_callback_query};
pub use connector::{ConnectorSnapshot, IntegrationConnector, validate_provider_url};
pub use http::HttpIntegrationApi;
pub use state::ConnectionState;
pub use status::ConnectionStatus;
pub use target::{ConnectContext, resolve_return_target};
