//! Domain models for users synced from the identity provider.
//!
//! Defines the persisted user entity, the insert payload assembled from a
//! `user.created` webhook, and a newtype ID wrapper for compile-time type
//! safety with database serialization support.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Strongly-typed local user identifier.
///
/// Wraps the UUID generated at insert time. This is the identifier written
/// back to the identity provider as `public_metadata.user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Creates a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl sqlx::Type<PgDb> for UserId {
    fn type_info() -> PgTypeInfo {
        <Uuid as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for UserId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let uuid = <Uuid as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(uuid))
    }
}

impl sqlx::Encode<'_, PgDb> for UserId {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <Uuid as sqlx::Encode<PgDb>>::encode_by_ref(&self.0, buf)
    }
}

/// A user record persisted in the local store.
///
/// Created exactly once when a `user.created` event arrives from the
/// identity provider; this code path never updates or deletes it. The
/// `external_id` column carries the provider-side identifier and is the
/// join key between the two systems.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Locally generated identifier, assigned at insert time.
    pub id: UserId,

    /// Identity-provider user identifier. Unique.
    pub external_id: String,

    /// Primary email address (first listed in the event payload).
    pub email: String,

    /// Username, empty string when the provider supplied none.
    pub username: String,

    /// Profile photo URL, empty string when the provider supplied none.
    pub photo_url: String,

    /// First name, if known.
    pub first_name: Option<String>,

    /// Last name, if known.
    pub last_name: Option<String>,

    /// When this record was inserted.
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new user.
///
/// Assembled by the webhook handler from a `user.created` payload. Optional
/// provider fields are defaulted to empty strings before insert, matching
/// the event extraction rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Identity-provider user identifier. Required.
    pub external_id: String,

    /// Primary email address. Required.
    pub email: String,

    /// Username, empty string when absent from the event.
    pub username: String,

    /// Profile photo URL, empty string when absent from the event.
    pub photo_url: String,

    /// First name, empty string when absent from the event.
    pub first_name: String,

    /// Last name, empty string when absent from the event.
    pub last_name: String,
}
