//! Persistent key-value session store.
//!
//! The logged-in identity (`token`, `username`, `balance`) is kept in a
//! [`SessionStore`] that is passed explicitly to whatever needs it, instead of
//! being read from ambient global state.
//!
//! # Implementations
//!
//! - [`MemorySessionStore`] - process-local, for tests and embedding
//! - [`FileSessionStore`] - JSON object on disk, survives restarts

use std::collections::{BTreeMap, HashMap};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use qkart_core::{AuthToken, LoginResponse, UserSession, session_keys};
use rust_decimal::Decimal;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when reading or writing the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Session file could not be read or written.
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session file is not a JSON object of strings.
    #[error("session file is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A persistent string key-value store.
pub trait SessionStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Store several values in one write.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SessionError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be written.
    fn clear(&self) -> Result<(), SessionError>;
}

// =============================================================================
// MemorySessionStore
// =============================================================================

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SessionError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in entries {
            values.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

// =============================================================================
// FileSessionStore
// =============================================================================

/// Session store backed by a JSON file.
///
/// The whole file is read on every access and rewritten on every change;
/// it only ever holds a handful of keys. Writes go to a temporary file in the
/// same directory that is then renamed over the session file, and on unix the
/// file is readable by its owner only since it holds the bearer token.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Create a store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(&serde_json::to_vec_pretty(values)?)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read()?;
        values.insert(key.to_string(), value.to_string());
        self.write(&values)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = self.read()?;
        for (key, value) in entries {
            values.insert((*key).to_string(), (*value).to_string());
        }
        self.write(&values)
    }

    fn clear(&self) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Reconstruct the logged-in user, if any.
///
/// A session exists when a token is stored. A missing username reads as
/// empty and an unparseable balance as zero.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn load_session(store: &dyn SessionStore) -> Result<Option<UserSession>, SessionError> {
    let Some(token) = store.get(session_keys::TOKEN)? else {
        return Ok(None);
    };

    let username = store.get(session_keys::USERNAME)?.unwrap_or_default();
    let balance = match store.get(session_keys::BALANCE)? {
        Some(raw) => raw.trim().parse::<Decimal>().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unparseable stored balance");
            Decimal::ZERO
        }),
        None => Decimal::ZERO,
    };

    Ok(Some(UserSession {
        token: AuthToken::new(token),
        username,
        balance,
    }))
}

/// Store the identity returned by a successful login.
///
/// The three keys are written together. If that fails the store is cleared so
/// no token is left behind without its username and balance.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn persist_login(store: &dyn SessionStore, login: &LoginResponse) -> Result<(), SessionError> {
    let balance = login.balance.to_string();
    let entries = [
        (session_keys::TOKEN, login.token.expose()),
        (session_keys::USERNAME, login.username.as_str()),
        (session_keys::BALANCE, balance.as_str()),
    ];

    if let Err(e) = store.set_many(&entries) {
        if let Err(clear_err) = store.clear() {
            warn!(error = %clear_err, "Failed to clear partially written session");
        }
        return Err(e);
    }
    debug!(username = %login.username, "Session persisted");
    Ok(())
}

/// Forget the logged-in user.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn logout(store: &dyn SessionStore) -> Result<(), SessionError> {
    store.clear()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn login_response() -> LoginResponse {
        LoginResponse {
            token: AuthToken::new("testtoken"),
            username: "criodo".to_string(),
            balance: Decimal::from(5000),
        }
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        assert_eq!(store.get("token").unwrap(), None);
        store.set("token", "abc").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        assert_eq!(store.get("token").unwrap(), None);
    }

    #[test]
    fn test_no_session_without_token() {
        let store = MemorySessionStore::new();
        store.set(session_keys::USERNAME, "criodo").unwrap();
        assert!(load_session(&store).unwrap().is_none());
    }

    #[test]
    fn test_persist_and_load() {
        let store = MemorySessionStore::new();
        persist_login(&store, &login_response()).unwrap();

        let session = load_session(&store).unwrap().unwrap();
        assert_eq!(session.token.expose(), "testtoken");
        assert_eq!(session.username, "criodo");
        assert_eq!(session.balance, Decimal::from(5000));
    }

    #[test]
    fn test_bad_balance_reads_as_zero() {
        let store = MemorySessionStore::new();
        store.set(session_keys::TOKEN, "t").unwrap();
        store.set(session_keys::BALANCE, "lots").unwrap();
        let session = load_session(&store).unwrap().unwrap();
        assert_eq!(session.balance, Decimal::ZERO);
    }

    #[test]
    fn test_logout_clears() {
        let store = MemorySessionStore::new();
        persist_login(&store, &login_response()).unwrap();
        logout(&store).unwrap();
        assert!(load_session(&store).unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = FileSessionStore::new(&path);
        persist_login(&store, &login_response()).unwrap();
        assert!(path.exists());

        let reopened = FileSessionStore::new(&path);
        let session = load_session(&reopened).unwrap().unwrap();
        assert_eq!(session.username, "criodo");
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get(session_keys::TOKEN).unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileSessionStore::new(&path);
        assert!(matches!(
            store.get(session_keys::TOKEN),
            Err(SessionError::Serde(_))
        ));
    }

    /// Accepts the token but refuses every other key, one key per write.
    struct RefusesUsername(MemorySessionStore);

    impl SessionStore for RefusesUsername {
        fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
            if key == session_keys::USERNAME {
                return Err(std::io::Error::other("disk full").into());
            }
            self.0.set(key, value)
        }

        fn clear(&self) -> Result<(), SessionError> {
            self.0.clear()
        }
    }

    #[test]
    fn test_failed_login_write_leaves_no_token() {
        let store = RefusesUsername(MemorySessionStore::new());

        assert!(persist_login(&store, &login_response()).is_err());

        assert_eq!(store.get(session_keys::TOKEN).unwrap(), None);
        assert!(load_session(&store).unwrap().is_none());
    }

    #[test]
    fn test_file_store_writes_all_keys_at_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileSessionStore::new(&path);

        store
            .set_many(&[(session_keys::TOKEN, "t"), (session_keys::USERNAME, "criodo")])
            .unwrap();

        let contents: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[session_keys::USERNAME], "criodo");
        // Only the session file remains; the temporary file was renamed over it.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileSessionStore::new(&path);
        store.set(session_keys::TOKEN, "secret-bearer").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "session file mode is {mode:o}");

        // Rewrites keep the mode.
        persist_login(&store, &login_response()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileSessionStore::new(&path);
        store.set("token", "abc").unwrap();
        store.clear().unwrap();
        assert!(!path.exists());
    }
}
