//! Durable session store.
//!
//! The local-storage analogue: a small JSON file holding the bearer token
//! and a cached copy of the signed-in user. Read at component mount,
//! written after login/logout/profile update. There is no cross-process
//! locking; concurrent instances are uncoordinated, and a logout in one
//! does not invalidate another's in-memory state.
//!
//! All identity reads in the crate go through [`SessionStore`], so there
//! is exactly one source of truth for "who is signed in".

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::models::User;

/// Token plus cached user, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to write session file: {0}")]
    Write(io::Error),
    #[error("failed to serialize session: {0}")]
    Serialize(serde_json::Error),
}

/// Injected session-provider capability. Components receive this instead
/// of reading ambient global state.
pub trait SessionStore: Send + Sync {
    /// The stored session, or `None` when signed out (or the store is
    /// unreadable; that degrades to signed-out with a logged trace).
    fn load(&self) -> Option<Session>;
    fn save(&self, session: &Session) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;

    fn current_user(&self) -> Option<User> {
        self.load().map(|session| session.user)
    }

    fn token(&self) -> Option<String> {
        self.load().map(|session| session.token)
    }
}

// ─── File-backed store ────────────────────────────────────────────────────────

/// JSON-file store under the application data directory.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default per-user location.
    pub fn default_location() -> Self {
        Self::new(config::session_file())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<Session> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "stored session is unreadable, treating as signed out"
                );
                None
            }
        }
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(SessionError::Write)?;
        }
        let json = serde_json::to_string_pretty(session).map_err(SessionError::Serialize)?;
        fs::write(&self.path, json).map_err(SessionError::Write)
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Write(e)),
        }
    }
}

// ─── In-memory store ──────────────────────────────────────────────────────────

/// In-memory store for tests and ephemeral sessions.
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<Session> {
        self.session.lock().ok()?.clone()
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Ok(mut guard) = self.session.lock() {
            *guard = Some(session.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        if let Ok(mut guard) = self.session.lock() {
            *guard = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn session() -> Session {
        Session {
            token: "tok-123".into(),
            user: User::new("u1", "Ana Lima", "ana@example.com", Role::Pacient),
        }
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        assert!(store.load().is_none());

        store.save(&session()).unwrap();
        assert_eq!(store.load(), Some(session()));
        assert_eq!(store.token().as_deref(), Some("tok-123"));
        assert_eq!(store.current_user().unwrap().id, "u1");
    }

    #[test]
    fn file_store_clear_removes_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));

        store.save(&session()).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());

        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn file_store_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested/deeper/session.json"));
        store.save(&session()).unwrap();
        assert!(store.load().is_some());
    }

    #[test]
    fn corrupt_file_degrades_to_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json at all").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(store.load().is_none());
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemorySessionStore::new();
        assert!(store.load().is_none());

        store.save(&session()).unwrap();
        assert_eq!(store.load(), Some(session()));

        store.clear().unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn memory_store_can_start_signed_in() {
        let store = MemorySessionStore::with_session(session());
        assert_eq!(store.current_user().unwrap().name, "Ana Lima");
    }
}
