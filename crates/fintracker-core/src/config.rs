//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! API base URL, where credentials are kept, the request timeout and the
//! last email used to sign in.
//!
//! Configuration is stored at `~/.config/fintracker/config.json`.
//! `FINTRACKER_API_URL` and `FINTRACKER_CREDENTIAL_BACKEND` override the
//! file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::DEFAULT_BASE_URL;
use crate::auth::{CredentialStore, FileCredentialStore, KeyringCredentialStore};

/// Application name used for config directory paths
const APP_NAME: &str = "fintracker";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Credential file name for the file backend
const CREDENTIALS_FILE: &str = "credentials.json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_API_URL: &str = "FINTRACKER_API_URL";
const ENV_CREDENTIAL_BACKEND: &str = "FINTRACKER_CREDENTIAL_BACKEND";

/// Where the credential pair is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    Keyring,
    File,
}

impl CredentialBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyring" | "keychain" => Some(CredentialBackend::Keyring),
            "file" => Some(CredentialBackend::File),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub credential_backend: CredentialBackend,
    pub request_timeout_secs: u64,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            credential_backend: CredentialBackend::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            last_email: None,
        }
    }
}

impl Config {
    /// Load from disk (defaults if absent), then apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(value) = lookup(ENV_CREDENTIAL_BACKEND) {
            match CredentialBackend::parse(&value) {
                Some(backend) => self.credential_backend = backend,
                None => warn!(value = %value, "Unknown credential backend, keeping configured one"),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn credentials_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CREDENTIALS_FILE))
    }

    /// Open the configured credential store
    pub fn credential_store(&self) -> Result<Arc<dyn CredentialStore>> {
        Ok(match self.credential_backend {
            CredentialBackend::Keyring => Arc::new(KeyringCredentialStore::default()),
            CredentialBackend::File => Arc::new(FileCredentialStore::new(Self::credentials_path()?)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = serde_json::from_str(r#"{"last_email":"a@b.com"}"#).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.last_email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            ENV_API_URL => Some("https://fin.example.com/api".to_string()),
            ENV_CREDENTIAL_BACKEND => Some("FILE".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "https://fin.example.com/api");
        assert_eq!(config.credential_backend, CredentialBackend::File);
    }

    #[test]
    fn test_unknown_backend_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == ENV_CREDENTIAL_BACKEND).then(|| "vault".to_string()));
        assert_eq!(config.credential_backend, CredentialBackend::Keyring);
    }

    #[test]
    fn test_backend_serializes_lowercase() {
        let json = serde_json::to_string(&CredentialBackend::File).unwrap();
        assert_eq!(json, "\"file\"");
    }
}
