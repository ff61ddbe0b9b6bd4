//! REST API client module for the FinTracker service.
//!
//! `ApiClient` is the request gateway: every call goes through
//! `ApiClient::send`, which attaches the stored bearer credential and
//! recovers from a single expired-credential rejection by renewing the pair
//! and retrying once.
//!
//! The typed auth and resource calls are thin wrappers over `send`.

mod auth;
pub mod client;
pub mod error;
mod resources;

pub use client::{ApiClient, ApiRequest, ApiResponse, DEFAULT_BASE_URL};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
pub use resources::{DEFAULT_MONTHLY_MONTHS, DEFAULT_RECENT_LIMIT};
