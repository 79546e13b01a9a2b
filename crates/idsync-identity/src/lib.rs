//! Management API client for the identity provider.
//!
//! The webhook receiver uses this crate for exactly one write-back call:
//! attaching the locally generated user identifier to the provider-side
//! user record as public metadata.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;

pub use client::{IdentityClient, IdentityConfig};
pub use error::{IdentityError, Result};
