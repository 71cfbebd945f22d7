//! Tack Core Library
//!
//! Client for the Freedom Boat Club reservation portal: logs in, keeps the
//! cookie session alive, scrapes the portal's legacy HTML/XML endpoints and
//! returns normalized locations, vessels, classifications and reservations.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`portal`] - session, transport, retry and the public query API
//! - [`extract`] - HTML/XML markup extraction into flat records
//! - [`model`] - normalized domain entities
//! - [`server`] - JSON facade over the query API

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod extract;
pub mod model;
mod patterns;
pub mod portal;
pub mod server;
mod user_agent;

// Re-export commonly used types
pub use model::{
    Availability, Classification, Location, QueryOptions, Reservation, Vessel, VesselDetails,
};
pub use portal::{Credentials, PortalApi, PortalClient, PortalConfig, PortalError, RetryPolicy};
pub use user_agent::BROWSER_USER_AGENT;
