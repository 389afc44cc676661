use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("Cannot determine home directory")]
    NoHomeDir,
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Credentials file {} is not valid: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode credentials: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

/// Where the client keeps its bearer token between requests.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, TokenStoreError>;
    fn save(&self, token: &str) -> Result<(), TokenStoreError>;
    /// Removes the token. Returns `false` when there was none.
    fn clear(&self) -> Result<bool, TokenStoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

/// Persists the token as `{"token": "..."}` in
/// `~/.ehrlite/credentials.<profile>.json`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn for_profile(profile: &str) -> Result<Self, TokenStoreError> {
        let dir = dirs::home_dir()
            .ok_or(TokenStoreError::NoHomeDir)?
            .join(".ehrlite");
        Ok(Self::at(dir.join(format!("credentials.{profile}.json"))))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let stored: StoredToken =
            serde_json::from_str(&content).map_err(|source| TokenStoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(stored.token).filter(|t| !t.is_empty()))
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        let content = encode(&StoredToken {
            token: token.to_string(),
        })?;
        fs::write(&self.path, content).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<bool, TokenStoreError> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path).map_err(|e| self.io_error(e))?;
        Ok(true)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, TokenStoreError> {
    serde_json::to_string_pretty(value).map_err(|source| TokenStoreError::Serialize { source })
}

/// Keeps the token in memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<bool, TokenStoreError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some())
    }
}
