//! Shared helpers for integration tests against a mock FinTracker API.

#![allow(dead_code)]

use std::sync::Arc;

use fintracker_core::auth::{CredentialPair, CredentialStore, MemoryCredentialStore};
use fintracker_core::navigation::{ChannelNavigator, Route};
use fintracker_core::{ApiClient, SessionController};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::{MockServer, ResponseTemplate};

/// Mock server plus a gateway wired to an inspectable store and navigator.
pub struct Harness {
    pub server: MockServer,
    pub store: Arc<dyn CredentialStore>,
    pub api: ApiClient,
    redirects: UnboundedReceiver<Route>,
}

impl Harness {
    /// Gateway with the given pair already stored (or nothing stored)
    pub async fn new(stored: Option<(&str, &str)>) -> Self {
        let store = match stored {
            Some((access, renewal)) => {
                MemoryCredentialStore::with_pair(&CredentialPair::new(access, renewal))
            }
            None => MemoryCredentialStore::new(),
        };
        Self::with_store(Arc::new(store)).await
    }

    pub async fn with_store(store: Arc<dyn CredentialStore>) -> Self {
        let server = MockServer::start().await;
        let (navigator, redirects) = ChannelNavigator::new();
        let api = ApiClient::new(
            &format!("{}/api", server.uri()),
            Arc::clone(&store),
            Arc::new(navigator),
        )
        .unwrap();
        Self {
            server,
            store,
            api,
            redirects,
        }
    }

    pub fn session(&self) -> SessionController {
        SessionController::new(self.api.clone())
    }

    /// Everything the gateway asked the navigator to do so far
    pub fn redirects(&mut self) -> Vec<Route> {
        let mut routes = Vec::new();
        while let Ok(route) = self.redirects.try_recv() {
            routes.push(route);
        }
        routes
    }

    pub fn stored_pair(&self) -> Option<CredentialPair> {
        self.store.read().unwrap().pair()
    }

    pub fn store_is_empty(&self) -> bool {
        self.store.read().unwrap().is_empty()
    }

    pub async fn request_count(&self) -> usize {
        self.server.received_requests().await.unwrap_or_default().len()
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn unauthorized() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid or expired token"}))
}

pub fn tokens(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
    }))
}

pub fn identity(id: &str, email: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"id": id, "email": email, "name": null}))
}

pub fn empty_list() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!([]))
}
