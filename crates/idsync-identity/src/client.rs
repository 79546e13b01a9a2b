//! HTTP client for the identity provider's management API.
//!
//! Handles request construction, authentication, and error categorization
//! for the metadata write-back call issued after a successful local insert.

use std::time::Duration;

use serde_json::json;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::{IdentityError, Result};

/// Configuration for the identity provider client.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Base URL of the management API, e.g. `https://api.clerk.com/v1`.
    pub base_url: String,
    /// Bearer token for management API authentication.
    pub api_token: String,
    /// Timeout for HTTP requests.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.clerk.com/v1".to_string(),
            api_token: String::new(),
            timeout: Duration::from_secs(30),
            user_agent: "Idsync/1.0".to_string(),
        }
    }
}

/// HTTP client for identity provider management calls.
///
/// Uses connection pooling and a configurable timeout. Errors are
/// categorized so the caller can log them distinctly, though the webhook
/// handler treats every failure as terminal for the delivery attempt.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    config: IdentityConfig,
}

impl IdentityClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Configuration` if the HTTP client cannot be
    /// built with the provided settings.
    pub fn new(config: IdentityConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                IdentityError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Configuration` if the HTTP client cannot be
    /// built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(IdentityConfig::default())
    }

    /// Attaches the local user identifier to the provider-side user record.
    ///
    /// Issues `PATCH {base}/users/{external_id}/metadata` setting
    /// `public_metadata.user_id` to the newly minted local UUID. The
    /// provider merges public metadata, so nothing else on the record is
    /// touched.
    ///
    /// # Errors
    ///
    /// Returns categorized errors:
    /// - `Timeout` when the request exceeds the configured timeout
    /// - `Network` for connection failures
    /// - `Api` for non-2xx responses
    pub async fn update_user_metadata(&self, external_id: &str, local_id: Uuid) -> Result<()> {
        let url = self.metadata_url(external_id);

        let span = info_span!(
            "identity_metadata_update",
            external_id = %external_id,
            user_id = %local_id,
        );

        async move {
            tracing::debug!("Updating identity provider metadata");

            let body = json!({
                "public_metadata": {
                    "user_id": local_id,
                }
            });

            let response = self
                .client
                .patch(&url)
                .bearer_auth(&self.config.api_token)
                .json(&body)
                .send()
                .await
                .map_err(|e| self.categorize(&e))?;

            let status = response.status();
            if status.is_success() {
                tracing::debug!(status = status.as_u16(), "Metadata update accepted");
                Ok(())
            } else {
                tracing::warn!(status = status.as_u16(), "Metadata update rejected");
                Err(IdentityError::Api { status_code: status.as_u16() })
            }
        }
        .instrument(span)
        .await
    }

    /// Builds the metadata endpoint URL for a provider-side user.
    fn metadata_url(&self, external_id: &str) -> String {
        format!("{}/users/{}/metadata", self.config.base_url.trim_end_matches('/'), external_id)
    }

    /// Maps a reqwest error to the identity error taxonomy.
    fn categorize(&self, err: &reqwest::Error) -> IdentityError {
        if err.is_timeout() {
            return IdentityError::timeout(self.config.timeout.as_secs());
        }
        if err.is_connect() {
            return IdentityError::network(format!("connection failed: {err}"));
        }
        IdentityError::network(err.to_string())
    }
}
