//! HTTP client for the dashboard's integration REST API.
//!
//! Implements [`IntegrationApi`] against the backend's
//! `integrations/{slug}/…` endpoints. This client sets no request timeout of
//! its own: the connector enforces its wall-clock deadlines around every
//! call.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;

use super::api::{DisconnectOutcome, IntegrationApi, OAuthStart};
use super::status::ConnectionStatus;

/// `IntegrationApi` over the dashboard backend's REST API.
pub struct HttpIntegrationApi {
    base_url: Url,
    slug: String,
    bearer_token: Option<SecretString>,
    client: reqwest::Client,
}

impl HttpIntegrationApi {
    /// `slug` names the integration in the URL path, e.g. `"mailbox"`.
    pub fn new(mut base_url: Url, slug: impl Into<String>) -> Self {
        // Url::join treats a base without a trailing slash as a file.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            slug: slug.into(),
            bearer_token: None,
            client: reqwest::Client::new(),
        }
    }

    /// Authenticate requests with a bearer token.
    pub fn with_bearer_token(mut self, token: SecretString) -> Self {
        self.bearer_token = Some(token);
        self
    }

    fn endpoint(&self, action: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(&format!("integrations/{}/{action}", self.slug))
            .map_err(|e| ApiError::Malformed(format!("bad endpoint for {action}: {e}")))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "integration API request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl IntegrationApi for HttpIntegrationApi {
    async fn get_connection_status(&self, user_id: &str) -> Result<ConnectionStatus, ApiError> {
        let url = self.endpoint("status")?;
        self.send_json(self.client.get(url).query(&[("user_id", user_id)]))
            .await
    }

    async fn start_oauth(&self, redirect_target: &str) -> Result<OAuthStart, ApiError> {
        let url = self.endpoint("connect")?;
        let body = serde_json::json!({ "redirect_target": redirect_target });
        self.send_json(self.client.post(url).json(&body)).await
    }

    async fn disconnect_integration(&self, user_id: &str) -> Result<DisconnectOutcome, ApiError> {
        let url = self.endpoint("disconnect")?;
        let body = serde_json::json!({ "user_id": user_id });
        self.send_json(self.client.post(url).json(&body)).await
    }
}
