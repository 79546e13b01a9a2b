//! Domain models and storage for the identity sync service.
//!
//! Provides the user entity synced from the identity provider, the error
//! taxonomy shared across crates, and the repository layer over PostgreSQL.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod storage;

pub use error::{CoreError, Result};
pub use models::{NewUser, User, UserId};
