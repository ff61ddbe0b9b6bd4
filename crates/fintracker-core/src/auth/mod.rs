//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `CredentialStore`: storage for the access/renewal credential pair, backed
//!   by memory, a JSON file or the OS keychain
//! - `SessionController`: the signed-in/signed-out state machine
//!
//! Identity is never persisted; it is re-derived from the stored credentials
//! on every start.

pub mod credentials;
pub mod session;

pub use credentials::{
    CredentialPair, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore, StoredCredentials,
};
pub use session::{SessionController, SessionPhase};
