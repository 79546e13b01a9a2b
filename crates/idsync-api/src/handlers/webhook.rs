//! Identity provider webhook handler.
//!
//! Verifies the signed delivery, branches on event type, persists the user
//! for `user.created`, and writes the new local identifier back to the
//! provider as public metadata. Every other event type is acknowledged
//! without side effects.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use idsync_core::{NewUser, User};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::AppState;

/// Event type tag that triggers a local insert.
const USER_CREATED_EVENT: &str = "user.created";

/// Event envelope sent by the identity provider.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    /// Event type tag, e.g. `user.created`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Event-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Payload of a `user.created` event.
///
/// Only the fields this service persists; the provider sends more.
#[derive(Debug, Deserialize)]
pub struct UserCreatedData {
    /// Identity-provider user identifier. Required.
    pub id: String,
    /// Email addresses in provider order; the first is treated as primary.
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    /// Username, if set on the provider side.
    #[serde(default)]
    pub username: Option<String>,
    /// Profile image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// A single email address entry in the event payload.
#[derive(Debug, Deserialize)]
pub struct EmailAddress {
    /// The address itself.
    pub email_address: String,
}

/// Response body for a successful user creation.
#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    /// Human-readable acknowledgement.
    pub message: String,
    /// The persisted user record, including its local identifier.
    pub user: User,
}

/// The three signature headers required on every delivery.
struct DeliveryHeaders {
    id: String,
    timestamp: String,
    signature: String,
}

/// Extracts the signed-delivery headers.
///
/// The provider sends both `webhook-*` and `svix-*` names; either is
/// accepted. Returns `None` when any of the three is missing or not valid
/// UTF-8.
fn delivery_headers(headers: &HeaderMap) -> Option<DeliveryHeaders> {
    let get = |primary: &str, alias: &str| {
        headers
            .get(primary)
            .or_else(|| headers.get(alias))
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };

    Some(DeliveryHeaders {
        id: get("webhook-id", "svix-id")?,
        timestamp: get("webhook-timestamp", "svix-timestamp")?,
        signature: get("webhook-signature", "svix-signature")?,
    })
}

/// Builds the insert payload from a `user.created` event.
///
/// The external identifier and the first listed email address are required;
/// every other field defaults to an empty string when absent. Returns
/// `None` when no email address is present.
fn build_new_user(data: UserCreatedData) -> Option<NewUser> {
    let UserCreatedData { id, email_addresses, username, image_url, first_name, last_name } = data;

    let email = email_addresses.into_iter().next()?.email_address;

    Some(NewUser {
        external_id: id,
        email,
        username: username.unwrap_or_default(),
        photo_url: image_url.unwrap_or_default(),
        first_name: first_name.unwrap_or_default(),
        last_name: last_name.unwrap_or_default(),
    })
}

/// Receives a signed webhook from the identity provider.
///
/// Flow: header check, signature verification, envelope parse, event-type
/// dispatch. For `user.created`, inserts the user and patches provider-side
/// metadata with the new local identifier. Each external call is wrapped
/// individually; failures are logged and converted to a generic 500 with no
/// retry and no rollback — the provider's own webhook retry policy is the
/// recovery mechanism.
///
/// # Responses
///
/// - `400` plain text: missing signature headers or verification failure
/// - `200` JSON `{message, user}`: user created and metadata patched
/// - `200` empty: any other event type
/// - `500` plain text: store insert or metadata update failure
#[instrument(
    name = "identity_webhook",
    skip(state, headers, body),
    fields(
        delivery_id = headers
            .get("webhook-id")
            .or_else(|| headers.get("svix-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown"),
    )
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(delivery) = delivery_headers(&headers) else {
        warn!("Webhook delivery is missing signature headers");
        return (StatusCode::BAD_REQUEST, "missing webhook signature headers").into_response();
    };

    let validation =
        state.verifier.verify(&delivery.id, &delivery.timestamp, &delivery.signature, &body);

    if !validation.is_valid {
        warn!(
            reason = validation.error_message.as_deref().unwrap_or("unknown"),
            "Webhook signature verification failed"
        );
        return (StatusCode::BAD_REQUEST, "webhook signature verification failed").into_response();
    }

    let envelope: EventEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!(error = %e, "Failed to parse webhook event envelope");
            return internal_error();
        },
    };

    info!(event_type = %envelope.kind, "Webhook event received");

    if envelope.kind != USER_CREATED_EVENT {
        debug!(event_type = %envelope.kind, "Unhandled event type, acknowledging");
        return (StatusCode::OK, "").into_response();
    }

    let data: UserCreatedData = match serde_json::from_value(envelope.data) {
        Ok(data) => data,
        Err(e) => {
            error!(error = %e, "user.created payload is missing required fields");
            return internal_error();
        },
    };

    let external_id = data.id.clone();

    let Some(new_user) = build_new_user(data) else {
        error!(external_id = %external_id, "user.created event carries no email addresses");
        return internal_error();
    };

    let user = match state.storage.users.create(&new_user).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, external_id = %external_id, "Failed to create user");
            return internal_error();
        },
    };

    info!(user_id = %user.id, external_id = %external_id, "User created");

    // Metadata update failures share the generic 500 path with creation
    // failures; the provider redelivers and the unique index absorbs the
    // duplicate insert.
    if let Err(e) = state.identity.update_user_metadata(&external_id, user.id.0).await {
        error!(error = %e, external_id = %external_id, "Failed to update provider metadata");
        return internal_error();
    }

    (
        StatusCode::OK,
        Json(UserCreatedResponse { message: "user created".to_string(), user }),
    )
        .into_response()
}

/// Generic 500 response shared by all internal failure paths.
fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}
