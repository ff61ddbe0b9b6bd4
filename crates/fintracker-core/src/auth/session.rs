use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{CredentialPair, CredentialStore};
use crate::models::Identity;

/// Lifecycle of client authentication.
///
/// `Initializing` exists only until the first `initialize` resolves; after
/// that the phase moves between `Authenticated` and `Anonymous` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Initializing,
    Authenticated(Identity),
    Anonymous,
}

impl SessionPhase {
    pub fn is_initializing(&self) -> bool {
        matches!(self, SessionPhase::Initializing)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionPhase::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Owns the signed-in state for the whole process.
///
/// Create one at startup and hand it (or `subscribe` receivers) to whatever
/// needs to observe the session.
pub struct SessionController {
    api: ApiClient,
    credentials: Arc<dyn CredentialStore>,
    phase: watch::Sender<SessionPhase>,
    started: AtomicBool,
}

impl SessionController {
    pub fn new(api: ApiClient) -> Self {
        let credentials = Arc::clone(api.credentials());
        let (phase, _) = watch::channel(SessionPhase::Initializing);
        Self {
            api,
            credentials,
            phase,
            started: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.phase.borrow().identity().cloned()
    }

    /// Receiver notified on every phase change
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    /// Resolve the startup phase from stored credentials.
    ///
    /// Only the first call does any work; later or concurrent calls wait for
    /// that resolution and return the current phase.
    pub async fn initialize(&self) -> SessionPhase {
        if self.started.swap(true, Ordering::AcqRel) {
            let mut rx = self.phase.subscribe();
            return match rx.wait_for(|phase| !phase.is_initializing()).await {
                Ok(phase) => phase.clone(),
                Err(_) => self.phase(),
            };
        }

        let resolved = match self.credentials.access_token() {
            Ok(Some(_)) => match self.api.me().await {
                Ok(identity) => SessionPhase::Authenticated(identity),
                Err(e) => {
                    warn!(error = %e, "Stored session could not be validated");
                    self.clear_credentials();
                    SessionPhase::Anonymous
                }
            },
            Ok(None) => SessionPhase::Anonymous,
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(error = %reason, "Failed to read stored credentials");
                SessionPhase::Anonymous
            }
        };

        // A sign-in or sign-out during startup wins over the startup result
        self.phase.send_if_modified(|current| {
            if current.is_initializing() {
                *current = resolved;
                true
            } else {
                false
            }
        });

        let phase = self.phase();
        info!(authenticated = phase.identity().is_some(), "Session initialized");
        phase
    }

    /// Sign in and load the identity.
    ///
    /// The phase only becomes `Authenticated` once the credentials are stored
    /// and the identity has been fetched. A rejected login leaves the phase
    /// unchanged; a failed identity lookup clears the new credentials and
    /// ends any existing session. The error carries the server's message
    /// when it sent one.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let tokens = self.api.login(email, password).await?;
        self.credentials
            .save(&CredentialPair::from(tokens))
            .map_err(ApiError::storage)?;

        let identity = match self.api.me().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Signed in but identity lookup failed");
                self.clear_credentials();
                // Any earlier session went with the cleared credentials
                self.phase.send_if_modified(|current| match current {
                    SessionPhase::Authenticated(_) => {
                        *current = SessionPhase::Anonymous;
                        true
                    }
                    _ => false,
                });
                return Err(e);
            }
        };

        info!(user_id = %identity.id, "Signed in");
        self.phase
            .send_replace(SessionPhase::Authenticated(identity.clone()));
        Ok(identity)
    }

    /// Create an account. The session is left as it is; sign in separately.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Identity, ApiError> {
        let identity = self.api.register(email, password, name).await?;
        debug!(user_id = %identity.id, "Account registered");
        Ok(identity)
    }

    /// Drop the credentials and become `Anonymous`. No network call.
    pub fn sign_out(&self) {
        self.clear_credentials();
        self.phase.send_replace(SessionPhase::Anonymous);
        info!("Signed out");
    }

    fn clear_credentials(&self) {
        if let Err(e) = self.credentials.clear() {
            let reason = format!("{:#}", e);
            warn!(error = %reason, "Failed to clear credentials");
        }
    }
}
