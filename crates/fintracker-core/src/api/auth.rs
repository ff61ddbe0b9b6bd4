use crate::models::{Identity, LoginRequest, RegisterRequest, TokenResponse};

use super::client::LOGIN_PATH;
use super::{ApiClient, ApiError, ApiRequest};

const REGISTER_PATH: &str = "/auth/register";
const ME_PATH: &str = "/auth/me";

impl ApiClient {
    /// Exchange email and password for a credential pair
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post(LOGIN_PATH).json(&LoginRequest { email, password })?;
        self.fetch(&request).await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Identity, ApiError> {
        let request = ApiRequest::post(REGISTER_PATH).json(&RegisterRequest {
            email,
            password,
            name,
        })?;
        self.fetch(&request).await
    }

    /// Who the stored access credential belongs to
    pub async fn me(&self) -> Result<Identity, ApiError> {
        self.fetch(&ApiRequest::get(ME_PATH)).await
    }
}
