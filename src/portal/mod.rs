//! Session-aware client for the reservation portal.
//!
//! # Flow
//!
//! caller → [`PortalClient`] query → [`Session::login`] (shared, at most one
//! in flight) → [`Transport`] request → re-login/retry per [`RetryPolicy`] →
//! [`crate::extract`] → [`crate::model`] entities.

mod builder;
mod client;
pub mod endpoints;
mod error;
mod retry;
mod session;
mod transport;

pub use client::{PortalApi, PortalClient, PortalConfig};
pub use endpoints::{DEFAULT_BASE_URL, Endpoint};
pub use error::PortalError;
pub use retry::{
    DEFAULT_MAX_RELOGINS, DEFAULT_MAX_TRANSIENT_RETRIES, FailureType, RetryDecision, RetryPolicy,
    classify_error, classify_status,
};
pub use session::{Credentials, Session};
pub use transport::{PortalRequest, RequestBody, RequestKind, Timeouts, Transport};
