//! Access/refresh token persistence. The stores hold exactly two values and
//! expose get/set/clear; they never log token material. `FileTokenStore`
//! re-reads its file on every access so several processes observe the same
//! session, the way browser tabs share `localStorage`.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, RwLock},
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("token file {path} is not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("token store lock poisoned")]
    Poisoned,
}

/// Key-value storage for the two session tokens.
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<SecretString>;

    fn refresh_token(&self) -> Option<SecretString>;

    /// Persists both tokens, replacing whatever was stored.
    ///
    /// # Errors
    /// Returns an error if the tokens cannot be persisted.
    fn set_tokens(&self, access: SecretString, refresh: SecretString) -> Result<(), StoreError>;

    /// Replaces the access token and keeps the refresh token.
    ///
    /// # Errors
    /// Returns an error if the token cannot be persisted.
    fn set_access_token(&self, access: SecretString) -> Result<(), StoreError>;

    /// Removes both tokens.
    ///
    /// # Errors
    /// Returns an error if the stored tokens cannot be removed.
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Clone, Default)]
struct Tokens {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
}

/// In-process token store, used by tests and short-lived embeddings.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Tokens>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        Self {
            tokens: RwLock::new(Tokens {
                access: Some(SecretString::from(access)),
                refresh: Some(SecretString::from(refresh)),
            }),
        }
    }

    fn read(&self) -> Tokens {
        self.tokens
            .read()
            .map(|tokens| tokens.clone())
            .unwrap_or_default()
    }

    fn update(&self, f: impl FnOnce(&mut Tokens)) -> Result<(), StoreError> {
        let mut tokens = self.tokens.write().map_err(|_| StoreError::Poisoned)?;
        f(&mut tokens);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tokens = self.read();
        f.debug_struct("MemoryTokenStore")
            .field("access_token", &tokens.access.as_ref().map(|_| "***"))
            .field("refresh_token", &tokens.refresh.as_ref().map(|_| "***"))
            .finish()
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<SecretString> {
        self.read().access
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.read().refresh
    }

    fn set_tokens(&self, access: SecretString, refresh: SecretString) -> Result<(), StoreError> {
        self.update(|tokens| {
            tokens.access = Some(access);
            tokens.refresh = Some(refresh);
        })
    }

    fn set_access_token(&self, access: SecretString) -> Result<(), StoreError> {
        self.update(|tokens| tokens.access = Some(access))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.update(|tokens| *tokens = Tokens::default())
    }
}

/// On-disk layout, keyed like the browser storage the backend's web client used.
#[derive(Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// Token store backed by a JSON file (mode `0600` on unix).
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<TokenFile, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(TokenFile::default()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(TokenFile::default());
        }

        serde_json::from_str(&contents).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })
    }

    fn load_or_empty(&self) -> TokenFile {
        self.load().unwrap_or_else(|err| {
            warn!("ignoring unreadable token file: {err}");
            TokenFile::default()
        })
    }

    fn save(&self, file: &TokenFile) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let payload = serde_json::to_string_pretty(file).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload).map_err(io_err)?;
        restrict_permissions(&tmp).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;

        debug!(path = %self.path.display(), "token file written");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut TokenFile)) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut file = self.load_or_empty();
        f(&mut file);
        self.save(&file)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn non_empty_secret(value: Option<String>) -> Option<SecretString> {
    value
        .filter(|token| !token.trim().is_empty())
        .map(SecretString::from)
}

impl TokenStore for FileTokenStore {
    fn access_token(&self) -> Option<SecretString> {
        non_empty_secret(self.load_or_empty().access_token)
    }

    fn refresh_token(&self) -> Option<SecretString> {
        non_empty_secret(self.load_or_empty().refresh_token)
    }

    fn set_tokens(&self, access: SecretString, refresh: SecretString) -> Result<(), StoreError> {
        self.update(|file| {
            file.access_token = Some(access.expose_secret().to_string());
            file.refresh_token = Some(refresh.expose_secret().to_string());
        })
    }

    fn set_access_token(&self, access: SecretString) -> Result<(), StoreError> {
        self.update(|file| file.access_token = Some(access.expose_secret().to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
