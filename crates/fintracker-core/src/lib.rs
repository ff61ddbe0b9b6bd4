//! Core library for FinTracker.
//!
//! This crate holds everything that is not presentation:
//! - `auth`: credential storage and the session controller
//! - `api`: the request gateway (`ApiClient`), its error type and the typed
//!   resource calls for transactions, categories, budgets and the dashboard
//! - `navigation`: views and the guard that decides what may be rendered
//! - `models`: request/response types of the FinTracker API
//! - `config`: on-disk configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResponse};
pub use auth::{CredentialPair, CredentialStore, SessionController, SessionPhase};
pub use config::Config;
pub use navigation::{guard, GuardDecision, Navigator, Route};
