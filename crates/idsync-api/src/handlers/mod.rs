//! HTTP request handlers for the identity sync API.
//!
//! Handlers are grouped by functionality:
//! - `webhook` - the signed identity provider webhook receiver
//! - `health` - health check and readiness probes

pub mod health;
pub mod webhook;

pub use health::{health_check, liveness_check, readiness_check};
pub use webhook::receive_webhook;
