//! Session ownership: one credential, one owner, explicit mutation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::DashboardError;
use crate::logging::{credential_fingerprint, log, obj, v_str, Domain, Level};

/// Persistent cache holding a single credential.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, DashboardError>;
    fn save(&self, credential: &str) -> Result<(), DashboardError>;
    fn remove(&self) -> Result<(), DashboardError>;
}

#[derive(Serialize, Deserialize)]
struct CachedCredential {
    jwt_token: String,
}

/// JSON file with one key, `jwt_token`.
#[derive(Debug, Clone)]
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
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>, DashboardError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let cached: CachedCredential = serde_json::from_str(&raw)
            .map_err(|e| DashboardError::Credential(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(cached.jwt_token).filter(|t| !t.is_empty()))
    }

    fn save(&self, credential: &str) -> Result<(), DashboardError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string(&CachedCredential { jwt_token: credential.to_string() })
            .map_err(|e| DashboardError::Credential(e.to_string()))?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), DashboardError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: &str) -> Self {
        Self { slot: Mutex::new(Some(credential.to_string())) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>, DashboardError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, credential: &str) -> Result<(), DashboardError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), DashboardError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Holds the active bearer credential and mirrors it into the cache.
pub struct SessionContext {
    credential: Mutex<Option<String>>,
    store: Box<dyn CredentialStore>,
}

impl SessionContext {
    pub fn new(store: Box<dyn CredentialStore>) -> Self {
        Self { credential: Mutex::new(None), store }
    }

    /// Adopts a cached credential, if any. Returns whether one was found.
    ///
    /// An unreadable cache entry is discarded and counts as no credential.
    pub fn restore(&self) -> Result<bool, DashboardError> {
        let mut slot = self.slot();
        let cached = match self.store.load() {
            Ok(cached) => cached,
            Err(DashboardError::Credential(reason)) => {
                log(Level::Warn, Domain::Session, "cache_discarded", obj(&[("reason", v_str(&reason))]));
                self.store.remove()?;
                None
            }
            Err(err) => return Err(err),
        };
        if let Some(token) = &cached {
            log(Level::Info, Domain::Session, "restored", obj(&[("session", v_str(&credential_fingerprint(token)))]));
        }
        let found = cached.is_some();
        *slot = cached;
        Ok(found)
    }

    pub fn set_credential(&self, credential: &str) -> Result<(), DashboardError> {
        if credential.trim().is_empty() {
            return Err(DashboardError::Authentication("empty credential".to_string()));
        }
        let mut slot = self.slot();
        self.store.save(credential)?;
        *slot = Some(credential.to_string());
        log(Level::Info, Domain::Session, "established", obj(&[("session", v_str(&credential_fingerprint(credential)))]));
        Ok(())
    }

    /// Forgets the credential in memory and in the cache.
    pub fn clear_credential(&self) -> Result<(), DashboardError> {
        let mut slot = self.slot();
        *slot = None;
        self.store.remove()?;
        log(Level::Info, Domain::Session, "cleared", obj(&[]));
        Ok(())
    }

    /// Clears the session only while it still holds `expected`. Returns
    /// whether it did; a credential set in the meantime is left alone.
    pub fn clear_if_current(&self, expected: &str) -> Result<bool, DashboardError> {
        let mut slot = self.slot();
        if slot.as_deref() != Some(expected) {
            return Ok(false);
        }
        *slot = None;
        self.store.remove()?;
        log(Level::Info, Domain::Session, "cleared", obj(&[("session", v_str(&credential_fingerprint(expected)))]));
        Ok(true)
    }

    pub fn credential(&self) -> Option<String> {
        self.slot().clone()
    }

    /// Whether the session still holds exactly `expected`.
    pub fn is_current(&self, expected: &str) -> bool {
        self.slot().as_deref() == Some(expected)
    }

    pub fn is_authenticated(&self) -> bool {
        self.slot().is_some()
    }

    // The slot holds a plain Option, so a panic elsewhere cannot leave it half-written.
    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.credential.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip_and_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/cred.json"));
        assert_eq!(store.load().unwrap(), None);
        store.save("tok-1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-1"));
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"jwt_token":"tok-1"}"#);
        store.remove().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.remove().unwrap();
    }

    #[test]
    fn test_restore_discards_corrupt_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cred.json");
        std::fs::write(&path, "{\"jwt_tok").unwrap();
        let session = SessionContext::new(Box::new(FileCredentialStore::new(&path)));
        assert!(!session.restore().unwrap());
        assert!(!session.is_authenticated());
        assert!(!path.exists());
    }

    #[test]
    fn test_clear_if_current_spares_newer_credential() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cred.json");
        let session = SessionContext::new(Box::new(FileCredentialStore::new(&path)));
        session.set_credential("stale").unwrap();
        session.set_credential("fresh").unwrap();

        assert!(!session.clear_if_current("stale").unwrap());
        assert_eq!(session.credential().as_deref(), Some("fresh"));
        assert!(path.exists());

        assert!(session.clear_if_current("fresh").unwrap());
        assert!(!session.is_authenticated());
        assert!(!path.exists());
    }

    #[test]
    fn test_poisoned_lock_still_updates() {
        let session = std::sync::Arc::new(SessionContext::new(Box::new(MemoryCredentialStore::new())));
        let poisoner = session.clone();
        let _ = std::thread::spawn(move || {
            let _held = poisoner.credential.lock().unwrap();
            panic!("poison the credential lock");
        })
        .join();
        assert!(session.credential.is_poisoned());

        session.set_credential("after-panic").unwrap();
        assert_eq!(session.credential().as_deref(), Some("after-panic"));
        assert!(session.is_current("after-panic"));
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cred.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileCredentialStore::new(&path);
        assert!(matches!(store.load(), Err(DashboardError::Credential(_))));
    }

    #[test]
    fn test_session_lifecycle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cred.json");
        let session = SessionContext::new(Box::new(FileCredentialStore::new(&path)));
        assert!(!session.restore().unwrap());
        assert!(!session.is_authenticated());

        session.set_credential("abc").unwrap();
        assert_eq!(session.credential().as_deref(), Some("abc"));

        let reopened = SessionContext::new(Box::new(FileCredentialStore::new(&path)));
        assert!(reopened.restore().unwrap());
        assert_eq!(reopened.credential().as_deref(), Some("abc"));

        reopened.clear_credential().unwrap();
        assert!(!reopened.is_authenticated());
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_credential_refused() {
        let session = SessionContext::new(Box::new(MemoryCredentialStore::new()));
        assert!(matches!(session.set_credential("  "), Err(DashboardError::Authentication(_))));
        assert!(!session.is_authenticated());
    }
}
