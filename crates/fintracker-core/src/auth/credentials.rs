use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::models::TokenResponse;

/// Keychain service name
const SERVICE_NAME: &str = "fintracker";

/// Storage key for the access credential
const ACCESS_KEY: &str = "access_token";

/// Storage key for the renewal credential
const RENEWAL_KEY: &str = "refresh_token";

/// Access and renewal credentials issued together by the API.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub access: String,
    pub renewal: String,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, renewal: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            renewal: renewal.into(),
        }
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &"<redacted>")
            .field("renewal", &"<redacted>")
            .finish()
    }
}

impl From<TokenResponse> for CredentialPair {
    fn from(tokens: TokenResponse) -> Self {
        Self::new(tokens.access_token, tokens.refresh_token)
    }
}

/// What a store currently holds. Each half may be missing independently;
/// nothing is filled in on read.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(rename = "access_token", default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(rename = "refresh_token", default, skip_serializing_if = "Option::is_none")]
    pub renewal: Option<String>,
}

impl StoredCredentials {
    /// The complete pair, if both halves are present
    pub fn pair(self) -> Option<CredentialPair> {
        match (self.access, self.renewal) {
            (Some(access), Some(renewal)) => Some(CredentialPair { access, renewal }),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.renewal.is_none()
    }
}

impl From<&CredentialPair> for StoredCredentials {
    fn from(pair: &CredentialPair) -> Self {
        Self {
            access: Some(pair.access.clone()),
            renewal: Some(pair.renewal.clone()),
        }
    }
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("access", &self.access.as_ref().map(|_| "<redacted>"))
            .field("renewal", &self.renewal.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Durable holder of the credential pair.
///
/// `save` must never leave a state where the renewal credential is new and
/// the access credential is old. `clear` removes both unconditionally.
pub trait CredentialStore: Send + Sync {
    fn save(&self, pair: &CredentialPair) -> Result<()>;

    fn read(&self) -> Result<StoredCredentials>;

    fn clear(&self) -> Result<()>;

    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.read()?.access)
    }

    fn renewal_token(&self) -> Result<Option<String>> {
        Ok(self.read()?.renewal)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store. Both halves are swapped under one lock.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<StoredCredentials>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: &CredentialPair) -> Self {
        Self {
            inner: Mutex::new(pair.into()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoredCredentials>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("Credential store lock poisoned"))
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, pair: &CredentialPair) -> Result<()> {
        *self.lock()? = pair.into();
        Ok(())
    }

    fn read(&self) -> Result<StoredCredentials> {
        Ok(self.lock()?.clone())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = StoredCredentials::default();
        Ok(())
    }
}

// ============================================================================
// File store
// ============================================================================

/// JSON file holding both credentials under distinct keys.
///
/// Each write goes to its own temp file in the same directory which is then
/// renamed over the target, so readers see either the old pair or the new one.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, pair: &CredentialPair) -> Result<()> {
        let dir = self.dir();
        std::fs::create_dir_all(dir).context("Failed to create credential directory")?;
        let contents = serde_json::to_string_pretty(&StoredCredentials::from(pair))?;

        // Unique name per save, created 0600 on unix
        let mut temp =
            NamedTempFile::new_in(dir).context("Failed to create temporary credential file")?;
        temp.write_all(contents.as_bytes())
            .context("Failed to write credential file")?;
        temp.persist(&self.path)
            .map_err(|e| e.error)
            .context("Failed to replace credential file")?;
        debug!(path = ?self.path, "Credentials saved");
        Ok(())
    }

    fn read(&self) -> Result<StoredCredentials> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredCredentials::default());
            }
            Err(e) => return Err(e).context("Failed to read credential file"),
        };
        serde_json::from_str(&contents).context("Failed to parse credential file")
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential file"),
        }
    }
}

// ============================================================================
// OS keychain store
// ============================================================================

/// Two keychain entries under one service name. The access credential is
/// written before the renewal credential.
pub struct KeyringCredentialStore {
    service: String,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

impl KeyringCredentialStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve credential from keychain"),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn save(&self, pair: &CredentialPair) -> Result<()> {
        self.entry(ACCESS_KEY)?
            .set_password(&pair.access)
            .context("Failed to store access credential in keychain")?;
        self.entry(RENEWAL_KEY)?
            .set_password(&pair.renewal)
            .context("Failed to store renewal credential in keychain")?;
        Ok(())
    }

    fn read(&self) -> Result<StoredCredentials> {
        Ok(StoredCredentials {
            access: self.get(ACCESS_KEY)?,
            renewal: self.get(RENEWAL_KEY)?,
        })
    }

    fn clear(&self) -> Result<()> {
        // Attempt both even if the first fails
        let access = self.delete(ACCESS_KEY);
        let renewal = self.delete(RENEWAL_KEY);
        access.and(renewal)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tempfile::TempDir;

    fn pair() -> CredentialPair {
        CredentialPair::new("access-1", "renewal-1")
    }

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemoryCredentialStore::new();
        assert!(store.read().unwrap().is_empty());
        assert_eq!(store.access_token().unwrap(), None);
    }

    #[test]
    fn test_memory_store_save_and_clear() {
        let store = MemoryCredentialStore::new();
        store.save(&pair()).unwrap();
        assert_eq!(store.read().unwrap().pair(), Some(pair()));

        store.clear().unwrap();
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_save_replaces_both() {
        let store = MemoryCredentialStore::with_pair(&pair());
        store.save(&CredentialPair::new("access-2", "renewal-2")).unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("access-2"));
        assert_eq!(store.renewal_token().unwrap().as_deref(), Some("renewal-2"));
    }

    #[test]
    fn test_file_store_missing_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_roundtrip_uses_distinct_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        let store = FileCredentialStore::new(&path);
        store.save(&pair()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["access_token"], "access-1");
        assert_eq!(raw["refresh_token"], "renewal-1");
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("credentials.json")]);

        assert_eq!(store.read().unwrap().pair(), Some(pair()));
    }

    #[test]
    fn test_file_store_partial_file_is_not_completed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, r#"{"access_token":"only-access"}"#).unwrap();

        let stored = FileCredentialStore::new(&path).read().unwrap();
        assert_eq!(stored.access.as_deref(), Some("only-access"));
        assert_eq!(stored.renewal, None);
        assert_eq!(stored.pair(), None);
    }

    #[test]
    fn test_file_store_clear_is_unconditional() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.clear().unwrap();

        store.save(&pair()).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_concurrent_saves_all_succeed() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileCredentialStore::new(dir.path().join("credentials.json")));

        let handles: Vec<_> = (0..2)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let pair = CredentialPair::new(format!("a-{t}-{i}"), format!("r-{t}-{i}"));
                        store.save(&pair).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = store.read().unwrap().pair().unwrap();
        assert!(stored.access.starts_with("a-"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        store.save(&pair()).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_debug_output_redacts_tokens() {
        let output = format!("{:?}", pair());
        assert!(!output.contains("access-1"));
        assert!(!output.contains("renewal-1"));
    }
}
