//! Durable session persistence.
//!
//! The backing store is a plain string key/value surface with per-key
//! atomicity only, so the [`SessionStore`] writes and reads the token and
//! profile as a disciplined pair: profile before token on save, token
//! before profile on load, and any partial state loads as absence. A
//! half-written session is therefore never treated as valid.
//!
//! Values live as one file per key under the taksi home directory, with
//! restricted permissions (0600) on Unix. Tokens are never logged in full.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use super::{AccountKind, Session, UserProfile};
use crate::config::paths;

/// Local persistence failure. Blocks the authenticated transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    pub message: String,
}

impl StorageError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StorageError {}

/// String-keyed durable storage with per-key atomicity.
///
/// This is the seam to the platform storage; the pairing discipline on
/// top of it lives in [`SessionStore`].
pub trait KeyValue: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-backed [`KeyValue`]: one file per key under a base directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at the taksi home directory.
    pub fn new() -> Self {
        Self::at(paths::taksi_home())
    }

    /// Creates a store rooted at a specific directory.
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValue for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StorageError::new(format!("Failed to read {}: {e}", path.display())))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::new(format!("Failed to create directory {}: {e}", parent.display()))
            })?;
        }

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)
                .map_err(|e| {
                    StorageError::new(format!(
                        "Failed to open {} for writing: {e}",
                        path.display()
                    ))
                })?;
            file.write_all(value.as_bytes()).map_err(|e| {
                StorageError::new(format!("Failed to write to {}: {e}", path.display()))
            })?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&path, value).map_err(|e| {
                StorageError::new(format!("Failed to write to {}: {e}", path.display()))
            })?;
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::new(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

/// Sole writer of durable session state.
///
/// Operations are serialized per process behind one in-memory mutex; no
/// cross-process coordination is attempted.
pub struct SessionStore {
    kv: Box<dyn KeyValue>,
    token_key: &'static str,
    profile_key: &'static str,
    lock: Mutex<()>,
}

impl SessionStore {
    /// Creates a store over the given backend for one account kind.
    pub fn new(kv: Box<dyn KeyValue>, kind: AccountKind) -> Self {
        Self {
            kv,
            token_key: kind.token_key(),
            profile_key: kind.profile_key(),
            lock: Mutex::new(()),
        }
    }

    /// Creates a file-backed store under the taksi home directory.
    pub fn open(kind: AccountKind) -> Self {
        Self::new(Box::new(FileStore::new()), kind)
    }

    /// Reads the persisted session, if any.
    ///
    /// Token is read before profile. A missing key or an undecodable
    /// profile is treated as absence, never as a fatal error.
    pub fn load(&self) -> Result<Option<Session>, StorageError> {
        let _guard = self.lock.lock().expect("session store mutex poisoned");

        let Some(token) = self.kv.get(self.token_key)? else {
            return Ok(None);
        };
        let Some(raw_profile) = self.kv.get(self.profile_key)? else {
            tracing::warn!("auth token present without profile, treating as logged out");
            return Ok(None);
        };

        match serde_json::from_str::<UserProfile>(&raw_profile) {
            Ok(user) => Ok(Some(Session { token, user })),
            Err(e) => {
                tracing::warn!(error = %e, "stored profile failed to decode, treating as logged out");
                Ok(None)
            }
        }
    }

    /// Persists the session.
    ///
    /// The profile is written before the token, so a crash between the two
    /// writes leaves a profile-without-token pair that loads as absence.
    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        let _guard = self.lock.lock().expect("session store mutex poisoned");

        let profile = serde_json::to_string(&session.user)
            .map_err(|e| StorageError::new(format!("Failed to serialize user profile: {e}")))?;
        self.kv.set(self.profile_key, &profile)?;
        self.kv.set(self.token_key, &session.token)?;
        Ok(())
    }

    /// Removes both entries. Clearing an already-empty store is not an
    /// error.
    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.lock.lock().expect("session store mutex poisoned");

        // Token first: an interrupted clear must not leave a loadable pair.
        self.kv.remove(self.token_key)?;
        self.kv.remove(self.profile_key)?;
        Ok(())
    }
}
