//! Integration connector — owns the OAuth lifecycle for one integration.
//!
//! One instance manages one integration for the current user: checking the
//! link on mount, the connect hand-off, the return callback, and disconnect.
//! Every awaited call carries an epoch token; a result is applied only if its
//! token is still current and the connector is still mounted, so a superseded
//! or abandoned operation can never clobber newer state.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tokio_stream::wrappers::WatchStream;
use url::Url;
use uuid::Uuid;

use crate::config::ConnectorConfig;
use crate::error::ConnectorError;
use crate::navigation::RoutePolicy;
use crate::notify::{Notification, NotificationSink};

use super::api::{Browser, ConfirmationPrompt, IntegrationApi};
use super::callback::{CallbackGuard, CallbackOutcome, parse_callback_query};
use super::state::ConnectionState;
use super::status::ConnectionStatus;
use super::target::{ConnectContext, resolve_return_target};

/// Observable snapshot: current state plus the cached status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorSnapshot {
    pub state: ConnectionState,
    pub status: Option<ConnectionStatus>,
}

type ConnectedHook = Box<dyn Fn(&ConnectionStatus) + Send + Sync>;

struct Inner {
    state: ConnectionState,
    status: Option<ConnectionStatus>,
}

/// Lifecycle manager for one OAuth-based integration.
pub struct IntegrationConnector {
    config: ConnectorConfig,
    policy: RoutePolicy,
    api: Arc<dyn IntegrationApi>,
    notifier: Arc<dyn NotificationSink>,
    browser: Arc<dyn Browser>,
    confirmer: Arc<dyn ConfirmationPrompt>,
    inner: RwLock<Inner>,
    snapshot_tx: watch::Sender<ConnectorSnapshot>,
    mounted: AtomicBool,
    // One live token per operation kind; a bump supersedes the in-flight call.
    status_epoch: AtomicU64,
    connect_epoch: AtomicU64,
    disconnect_epoch: AtomicU64,
    callback_guard: CallbackGuard,
    on_connected: Mutex<Option<ConnectedHook>>,
}

impl IntegrationConnector {
    pub fn new(
        config: ConnectorConfig,
        policy: RoutePolicy,
        api: Arc<dyn IntegrationApi>,
        notifier: Arc<dyn NotificationSink>,
        browser: Arc<dyn Browser>,
        confirmer: Arc<dyn ConfirmationPrompt>,
    ) -> Self {
        let initial = ConnectorSnapshot {
            state: ConnectionState::Unknown,
            status: None,
        };
        let (snapshot_tx, _) = watch::channel(initial);
        Self {
            config,
            policy,
            api,
            notifier,
            browser,
            confirmer,
            inner: RwLock::new(Inner {
                state: ConnectionState::Unknown,
                status: None,
            }),
            snapshot_tx,
            mounted: AtomicBool::new(true),
            status_epoch: AtomicU64::new(0),
            connect_epoch: AtomicU64::new(0),
            disconnect_epoch: AtomicU64::new(0),
            callback_guard: CallbackGuard::new(),
            on_connected: Mutex::new(None),
        }
    }

    // ── Observation ─────────────────────────────────────────────────

    pub fn snapshot(&self) -> ConnectorSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.snapshot_tx.borrow().state
    }

    pub fn status(&self) -> Option<ConnectionStatus> {
        self.snapshot_tx.borrow().status.clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectorSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Snapshot changes as a `Stream`, for hosts that render from streams.
    pub fn snapshot_stream(&self) -> WatchStream<ConnectorSnapshot> {
        WatchStream::new(self.subscribe())
    }

    /// Register a hook fired exactly once per transition into `Connected`.
    /// The hook runs on the caller's task; keep it light.
    pub fn on_connected(&self, hook: impl Fn(&ConnectionStatus) + Send + Sync + 'static) {
        *self.on_connected.lock().expect("hook lock poisoned") = Some(Box::new(hook));
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Abandon all in-flight work. Resolutions arriving after this never
    /// touch state.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        Self::begin(&self.status_epoch);
        Self::begin(&self.connect_epoch);
        Self::begin(&self.disconnect_epoch);
        tracing::debug!(integration = %self.config.integration, "connector unmounted");
    }

    // ── Operations ──────────────────────────────────────────────────

    /// Refresh the cached status from the server.
    ///
    /// Supersedes any in-flight status check; the most recently initiated
    /// call is the one whose result counts. No automatic retry on failure —
    /// retry is user-initiated.
    pub async fn check_status(&self, user_id: &str) -> Result<(), ConnectorError> {
        if !self.is_mounted() {
            return Ok(());
        }
        {
            let mut inner = self.inner.write().await;
            if inner.state != ConnectionState::Checking {
                self.transition(&mut inner, ConnectionState::Checking, "check status")?;
            }
        }
        let token = Self::begin(&self.status_epoch);
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, user_id, "status check started");

        let result = tokio::time::timeout(
            self.config.status_timeout,
            self.api.get_connection_status(user_id),
        )
        .await;

        if !self.is_current(&self.status_epoch, token) {
            tracing::debug!(%request_id, "status check superseded; result dropped");
            return Ok(());
        }

        match result {
            Ok(Ok(status)) => {
                let rest = status.rest_state();
                let mut inner = self.inner.write().await;
                inner.status = Some(status);
                self.transition(&mut inner, rest, "check status")?;
                tracing::info!(%request_id, state = %rest, "status check complete");
                Ok(())
            }
            Ok(Err(api_err)) => {
                self.fail("status check", request_id, ConnectorError::from_api(api_err))
                    .await
            }
            Err(_) => {
                self.fail(
                    "status check",
                    request_id,
                    ConnectorError::Timeout {
                        operation: "status check",
                        timeout: self.config.status_timeout,
                    },
                )
                .await
            }
        }
    }

    /// Begin the OAuth hand-off. Valid only from `Disconnected` or `Error`.
    ///
    /// The authorization URL's origin is validated against the provider
    /// allow-list before any navigation; a URL that fails validation is never
    /// opened.
    pub async fn connect(&self, ctx: &ConnectContext<'_>) -> Result<(), ConnectorError> {
        if !self.is_mounted() {
            return Ok(());
        }
        {
            let mut inner = self.inner.write().await;
            if !inner.state.can_connect() {
                return Err(ConnectorError::InvalidState {
                    operation: "connect",
                    state: inner.state.to_string(),
                });
            }
            self.transition(&mut inner, ConnectionState::Connecting, "connect")?;
        }
        let token = Self::begin(&self.connect_epoch);
        let request_id = Uuid::new_v4();
        let return_target = resolve_return_target(&self.policy, ctx);
        tracing::debug!(%request_id, %return_target, "requesting authorization URL");

        // New flow: the next callback is fresh.
        self.callback_guard.arm();

        let result = tokio::time::timeout(
            self.config.connect_timeout,
            self.api.start_oauth(&return_target),
        )
        .await;

        if !self.is_current(&self.connect_epoch, token) {
            tracing::debug!(%request_id, "connect superseded; result dropped");
            return Ok(());
        }

        let start = match result {
            Ok(Ok(start)) => start,
            Ok(Err(api_err)) => {
                return self
                    .fail("connect", request_id, ConnectorError::from_api(api_err))
                    .await;
            }
            Err(_) => {
                return self
                    .fail(
                        "connect",
                        request_id,
                        ConnectorError::Timeout {
                            operation: "connect",
                            timeout: self.config.connect_timeout,
                        },
                    )
                    .await;
            }
        };

        let url = match validate_provider_url(
            &start.authorization_url,
            &self.config.allowed_provider_origins,
        ) {
            Ok(url) => url,
            Err(err) => return self.fail("connect", request_id, err).await,
        };

        {
            let mut inner = self.inner.write().await;
            self.transition(&mut inner, ConnectionState::AwaitingCallback, "connect")?;
        }
        tracing::info!(
            %request_id,
            provider = %url.origin().ascii_serialization(),
            "handing off to provider"
        );
        self.browser.open_external(&url);
        Ok(())
    }

    /// Handle the browser's return from the provider.
    ///
    /// Idempotent under re-render: the callback parameters are stripped from
    /// the URL before any await, and a one-shot guard ensures the follow-up
    /// status check and the success notification fire once per flow.
    pub async fn handle_callback(&self, user_id: &str, query: &str) -> Result<(), ConnectorError> {
        let Some(outcome) = parse_callback_query(query) else {
            return Ok(());
        };

        self.browser.clear_callback_params();

        if !self.callback_guard.try_consume() {
            tracing::debug!("duplicate OAuth callback ignored");
            return Ok(());
        }

        match outcome {
            CallbackOutcome::Success => {
                tracing::info!(user_id, "provider reported success; confirming");
                // The backend may still be finalizing the link; see
                // `ConnectorConfig::callback_grace`.
                tokio::time::sleep(self.config.callback_grace).await;
                if !self.is_mounted() {
                    return Ok(());
                }
                self.check_status(user_id).await?;
                let snapshot = self.snapshot();
                if snapshot.state == ConnectionState::Connected {
                    let mut notification = Notification::success(format!(
                        "{} connected",
                        self.config.integration
                    ));
                    if let Some(account) = snapshot
                        .status
                        .as_ref()
                        .and_then(|s| s.account_identifier.clone())
                    {
                        notification = notification.with_message(account);
                    }
                    self.notifier.notify(notification);
                }
                Ok(())
            }
            CallbackOutcome::Error(message) => {
                tracing::warn!(user_id, error = %message, "provider reported failure");
                {
                    let mut inner = self.inner.write().await;
                    // Fresh mounts land here in `Unknown`; leave that alone
                    // and let the mount-time status check settle it.
                    if inner.state.can_transition_to(ConnectionState::Error) {
                        let _ =
                            self.transition(&mut inner, ConnectionState::Error, "oauth callback");
                    }
                }
                self.notifier.notify(
                    Notification::error(format!("{} connection failed", self.config.integration))
                        .with_message(message),
                );
                Ok(())
            }
        }
    }

    /// Tear down the integration, after explicit user confirmation.
    ///
    /// The local `Disconnected` state is optimistic; a confirming status
    /// check gets the last word. If the disconnect call or the confirming
    /// check fails, the previous status is restored and one notification
    /// fires.
    pub async fn disconnect(&self, user_id: &str) -> Result<(), ConnectorError> {
        if !self.is_mounted() {
            return Ok(());
        }
        let previous_status = {
            let inner = self.inner.read().await;
            if inner.state != ConnectionState::Connected {
                return Err(ConnectorError::InvalidState {
                    operation: "disconnect",
                    state: inner.state.to_string(),
                });
            }
            inner.status.clone()
        };

        let account = previous_status
            .as_ref()
            .and_then(|s| s.account_identifier.as_deref())
            .unwrap_or("This account");
        let confirmed = self
            .confirmer
            .confirm(
                &format!("Disconnect {}?", self.config.integration),
                &format!("{account} will stop syncing until you reconnect."),
            )
            .await;
        if !confirmed {
            tracing::debug!(user_id, "disconnect declined");
            return Err(ConnectorError::UserCancelled);
        }

        {
            let mut inner = self.inner.write().await;
            // The prompt suspended; the state may have moved meanwhile.
            if inner.state != ConnectionState::Connected {
                return Err(ConnectorError::InvalidState {
                    operation: "disconnect",
                    state: inner.state.to_string(),
                });
            }
            self.transition(&mut inner, ConnectionState::Disconnecting, "disconnect")?;
        }
        let token = Self::begin(&self.disconnect_epoch);
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, user_id, "disconnect started");

        let result = tokio::time::timeout(
            self.config.disconnect_timeout,
            self.api.disconnect_integration(user_id),
        )
        .await;

        if !self.is_current(&self.disconnect_epoch, token) {
            tracing::debug!(%request_id, "disconnect superseded; result dropped");
            return Ok(());
        }

        let failure = match result {
            Ok(Ok(outcome)) if outcome.success => None,
            Ok(Ok(outcome)) => Some(ConnectorError::Network(
                outcome
                    .error
                    .unwrap_or_else(|| "disconnect rejected by service".to_string()),
            )),
            Ok(Err(api_err)) => Some(ConnectorError::from_api(api_err)),
            Err(_) => Some(ConnectorError::Timeout {
                operation: "disconnect",
                timeout: self.config.disconnect_timeout,
            }),
        };

        if let Some(err) = failure {
            tracing::warn!(%request_id, error = %err, "disconnect failed; reverting");
            {
                let mut inner = self.inner.write().await;
                self.restore(&mut inner, ConnectionState::Connected, previous_status);
            }
            self.notify_failure(&err);
            return Err(err);
        }

        {
            let mut inner = self.inner.write().await;
            inner.status = Some(ConnectionStatus::disconnected());
            self.transition(&mut inner, ConnectionState::Disconnected, "disconnect")?;
        }
        tracing::info!(%request_id, "disconnected; confirming against server");

        let confirm_token = Self::begin(&self.status_epoch);
        let confirm = tokio::time::timeout(
            self.config.status_timeout,
            self.api.get_connection_status(user_id),
        )
        .await;

        if !self.is_current(&self.status_epoch, confirm_token) {
            return Ok(());
        }

        match confirm {
            Ok(Ok(status)) => {
                let mut inner = self.inner.write().await;
                if status.connected {
                    // Server still reports a live link; its word beats the
                    // optimistic update.
                    self.restore(&mut inner, ConnectionState::Connected, Some(status));
                } else {
                    inner.status = Some(status);
                    self.publish(&inner);
                }
                Ok(())
            }
            Ok(Err(api_err)) => {
                self.revert_failed_confirm(request_id, ConnectorError::from_api(api_err), previous_status)
                    .await
            }
            Err(_) => {
                self.revert_failed_confirm(
                    request_id,
                    ConnectorError::Timeout {
                        operation: "status check",
                        timeout: self.config.status_timeout,
                    },
                    previous_status,
                )
                .await
            }
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    fn begin(epoch: &AtomicU64) -> u64 {
        epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, epoch: &AtomicU64, token: u64) -> bool {
        self.is_mounted() && epoch.load(Ordering::SeqCst) == token
    }

    fn publish(&self, inner: &Inner) {
        self.snapshot_tx.send_replace(ConnectorSnapshot {
            state: inner.state,
            status: inner.status.clone(),
        });
    }

    fn transition(
        &self,
        inner: &mut Inner,
        target: ConnectionState,
        operation: &'static str,
    ) -> Result<(), ConnectorError> {
        if !inner.state.can_transition_to(target) {
            tracing::warn!(from = %inner.state, to = %target, operation, "invalid state transition");
            return Err(ConnectorError::InvalidState {
                operation,
                state: inner.state.to_string(),
            });
        }
        tracing::debug!(from = %inner.state, to = %target, "state transition");
        inner.state = target;
        self.publish(inner);
        if target == ConnectionState::Connected {
            self.fire_on_connected(inner);
        }
        Ok(())
    }

    /// Restore a previously valid rest state (disconnect revert). Not a
    /// forward transition: the legality table and the connected hook are
    /// bypassed.
    fn restore(&self, inner: &mut Inner, state: ConnectionState, status: Option<ConnectionStatus>) {
        tracing::debug!(from = %inner.state, to = %state, "state restored");
        inner.state = state;
        inner.status = status;
        self.publish(inner);
    }

    fn fire_on_connected(&self, inner: &Inner) {
        let hook = self.on_connected.lock().expect("hook lock poisoned");
        if let (Some(hook), Some(status)) = (hook.as_ref(), inner.status.as_ref()) {
            hook(status);
        }
    }

    async fn fail(
        &self,
        operation: &'static str,
        request_id: Uuid,
        err: ConnectorError,
    ) -> Result<(), ConnectorError> {
        tracing::warn!(%request_id, operation, error = %err, "operation failed");
        {
            let mut inner = self.inner.write().await;
            if inner.state.can_transition_to(ConnectionState::Error) {
                let _ = self.transition(&mut inner, ConnectionState::Error, operation);
            }
        }
        self.notify_failure(&err);
        Err(err)
    }

    async fn revert_failed_confirm(
        &self,
        request_id: Uuid,
        err: ConnectorError,
        previous_status: Option<ConnectionStatus>,
    ) -> Result<(), ConnectorError> {
        tracing::warn!(%request_id, error = %err, "confirming status check failed; reverting");
        {
            let mut inner = self.inner.write().await;
            self.restore(&mut inner, ConnectionState::Connected, previous_status);
        }
        self.notify_failure(&err);
        Err(err)
    }

    fn notify_failure(&self, err: &ConnectorError) {
        if !err.is_user_visible() {
            return;
        }
        let integration = &self.config.integration;
        let notification = match err {
            ConnectorError::Timeout { .. } => {
                Notification::error(format!("{integration} request timed out"))
                    .with_message("The service took too long to respond. Try again in a moment.")
            }
            ConnectorError::Network(reason) => {
                Notification::error(format!("{integration} connection problem"))
                    .with_message(reason.clone())
            }
            ConnectorError::InvalidResponse(reason) => {
                Notification::error(format!("Unexpected reply from {integration}"))
                    .with_message(reason.clone())
            }
            ConnectorError::SecurityViolation { .. } => {
                Notification::error(format!("{integration} sign-in blocked")).with_message(
                    "The sign-in address returned by the server was not recognized.",
                )
            }
            ConnectorError::UserCancelled | ConnectorError::InvalidState { .. } => return,
        };
        self.notifier.notify(notification);
    }
}

/// Validate an authorization URL against the provider origin allow-list.
///
/// Origin comparison covers scheme, host, and port. Opaque origins
/// (`data:`, `javascript:`, …) never match.
pub fn validate_provider_url(
    raw: &str,
    allowed_origins: &[String],
) -> Result<Url, ConnectorError> {
    let url = Url::parse(raw)
        .map_err(|e| ConnectorError::InvalidResponse(format!("authorization URL unparseable: {e}")))?;
    let origin = url.origin();
    if origin.is_tuple() {
        for allowed in allowed_origins {
            if let Ok(candidate) = Url::parse(allowed) {
                if candidate.origin() == origin {
                    return Ok(url);
                }
            }
        }
    }
    Err(ConnectorError::SecurityViolation {
        url: raw.to_string(),
    })
}
