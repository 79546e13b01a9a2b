//! HTTP API for the identity webhook sync service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod handlers;
pub mod server;

use std::sync::Arc;

use idsync_core::storage::Storage;
use idsync_identity::IdentityClient;

pub use config::Config;
pub use server::{create_router, start_server};

use crate::crypto::WebhookVerifier;

/// Shared application state for request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database access layer.
    pub storage: Storage,
    /// Verifier for signed webhook deliveries.
    pub verifier: Arc<WebhookVerifier>,
    /// Client for the identity provider's management API.
    pub identity: Arc<IdentityClient>,
}

impl AppState {
    /// Creates application state from its components.
    pub fn new(storage: Storage, verifier: Arc<WebhookVerifier>, identity: Arc<IdentityClient>) -> Self {
        Self { storage, verifier, identity }
    }
}
