//! Request gateway for the FinTracker REST API.
//!
//! Every outbound call is described by an `ApiRequest` and sent through
//! `ApiClient::send`. The gateway reads the access credential from the
//! credential store before each call, and on a 401 performs at most one
//! renew-and-retry cycle for that call. When renewal is impossible the
//! stored credentials are cleared and the navigator is told to go to the
//! sign-in view.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{CredentialPair, CredentialStore};
use crate::models::TokenResponse;
use crate::navigation::{Navigator, Route};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Credential exchange endpoints. A 401 from these never triggers renewal.
pub(crate) const LOGIN_PATH: &str = "/auth/login";
pub(crate) const REFRESH_PATH: &str = "/auth/refresh";

// ============================================================================
// Request / response
// ============================================================================

/// A single API call, relative to the client's base URL.
///
/// Requests are immutable once built and may be dispatched more than once.
#[derive(Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to encode body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Login and refresh calls handle their own 401s.
    fn exchanges_credentials(&self) -> bool {
        self.path.contains(LOGIN_PATH) || self.path.contains(REFRESH_PATH)
    }
}

// Bodies may carry passwords, so only the target is printed.
impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query.len())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// A response with its body read into memory. `send` only hands out 2xx ones.
#[derive(Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ApiError::InvalidResponse(format!("{}: {}", e, ApiError::truncate_body(&self.body)))
        })
    }

    /// Non-success statuses become typed rejections
    fn into_result(self) -> Result<Self, ApiError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.body))
        }
    }
}

impl fmt::Debug for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiResponse")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Which dispatch of an original request this is. Only `First` may renew.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retried,
}

impl Attempt {
    fn next(self) -> Option<Self> {
        match self {
            Attempt::First => Some(Attempt::Retried),
            Attempt::Retried => None,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// API client for FinTracker.
/// Clone is cheap - reqwest::Client and the shared collaborators are Arc'd.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(
        base_url: &str,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        Self::with_timeout(
            base_url,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
            credentials,
            navigator,
        )
    }

    pub fn with_timeout(
        base_url: &str,
        timeout: Duration,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request through the gateway.
    ///
    /// A 401 on the first attempt (outside login/refresh) renews the
    /// credential pair and re-dispatches once; whatever the retry returns is
    /// final. If renewal fails the session is ended and the original 401 is
    /// returned.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut bearer = self.credentials.access_token().map_err(ApiError::storage)?;
        let mut attempt = Attempt::First;

        loop {
            let response = self.dispatch(request, bearer.as_deref(), attempt).await?;
            if response.status() != StatusCode::UNAUTHORIZED || request.exchanges_credentials() {
                return response.into_result();
            }

            let Some(next) = attempt.next() else {
                debug!(path = %request.path, "Still unauthorized after renewal");
                return response.into_result();
            };

            match self.renew().await {
                Ok(pair) => {
                    bearer = Some(pair.access);
                    attempt = next;
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    warn!(path = %request.path, error = %reason, "Credential renewal failed");
                    self.end_session();
                    return response.into_result();
                }
            }
        }
    }

    /// Send and decode a JSON body
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    /// Send and discard the body (e.g. 204 responses)
    pub async fn execute(&self, request: &ApiRequest) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
        attempt: Attempt,
    ) -> Result<ApiResponse, ApiError> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path))
            .header(header::ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        debug!(
            method = %request.method,
            path = %request.path,
            ?attempt,
            authenticated = bearer.is_some(),
            "Sending request"
        );

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(path = %request.path, status = status.as_u16(), "Received response");
        Ok(ApiResponse { status, body })
    }

    /// Exchange the stored renewal credential for a new pair and store it.
    /// Sent directly, never through `send`.
    async fn renew(&self) -> Result<CredentialPair> {
        let renewal = self
            .credentials
            .renewal_token()?
            .context("No renewal credential stored")?;

        let response = self
            .client
            .post(self.url(REFRESH_PATH))
            .header(header::ACCEPT, "application/json")
            .query(&[("refresh_token", renewal.as_str())])
            .send()
            .await
            .context("Failed to send renewal request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .context("Failed to parse renewal response")?;
        let pair = CredentialPair::from(tokens);
        self.credentials
            .save(&pair)
            .context("Failed to store renewed credentials")?;

        info!("Credentials renewed");
        Ok(pair)
    }

    /// Unrecoverable: drop the credentials and send the user to sign in.
    fn end_session(&self) {
        if let Err(e) = self.credentials.clear() {
            let reason = format!("{:#}", e);
            warn!(error = %reason, "Failed to clear credentials");
        }
        self.navigator.redirect(Route::SignIn);
    }
}
