//! Persistent storage for Reddit credentials
//!
//! Tokens are kept as plain string values under a fixed key namespace. The
//! file-backed store encrypts the whole namespace map with AES-256-GCM.

use crate::utils::crypto::{decrypt_data, derive_encryption_key, encrypt_data, ENCRYPTION_KEY_SIZE};
use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage key for the current access token
pub const ACCESS_TOKEN_KEY: &str = "reddit_access_token";

/// Storage key for the long-lived refresh token
pub const REFRESH_TOKEN_KEY: &str = "reddit_refresh_token";

/// Storage key for the pending authorization `state` nonce
pub const OAUTH_STATE_KEY: &str = "reddit_oauth_state";

/// Key/value storage for credential strings
pub trait TokenStore: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow!("token store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Encrypted single-file store
///
/// Every write rewrites the whole file. A file that cannot be decrypted (for
/// example after the storage secret changed) reads as empty.
pub struct FileTokenStore {
    path: PathBuf,
    key: [u8; ENCRYPTION_KEY_SIZE],
    lock: Mutex<()>,
}

impl FileTokenStore {
    /// Create a store at `path`, deriving the encryption key from `secret`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, secret: &str) -> Self {
        Self {
            path: path.into(),
            key: derive_encryption_key(secret.as_bytes()),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }

        match decrypt_data::<HashMap<String, String>>(&contents, &self.key) {
            Ok(values) => Ok(values),
            Err(e) => {
                warn!(
                    "Ignoring unreadable token file {}: {e}",
                    self.path.display()
                );
                Ok(HashMap::new())
            }
        }
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create token directory {}", parent.display())
                })?;
            }
        }

        let encrypted = encrypt_data(values, &self.key)?;
        fs::write(&self.path, encrypted)
            .with_context(|| format!("Failed to write token file {}", self.path.display()))?;
        debug!("Token file {} updated ({} values)", self.path.display(), values.len());
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("token file lock poisoned"))?;
        let mut values = self.read_all()?;
        if apply(&mut values) {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("token file lock poisoned"))?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| values.remove(key).is_some())
    }
}
