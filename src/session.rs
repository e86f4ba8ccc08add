use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::models::User;

/// Token + profile pair handed out by the auth endpoints.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Restore has not been attempted yet.
    Loading,
    Authenticated,
    Unauthenticated,
}

enum State {
    Unresolved,
    Anonymous,
    Active(Session),
}

/// Process-wide session state, created once at startup and mutated only by
/// login/logout. Backed by a file so a session survives across invocations,
/// the way the original client keeps it in browser storage.
pub struct SessionStore {
    path: PathBuf,
    state: Mutex<State>,
}

impl SessionStore {
    pub fn open(path: &Path) -> Self {
        SessionStore {
            path: path.to_path_buf(),
            state: Mutex::new(State::Unresolved),
        }
    }

    /// Attempt to load a persisted session. A missing or unreadable file
    /// resolves to an anonymous session.
    pub fn restore(&self) {
        let restored = match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => Some(session),
                Err(err) => {
                    log::warn!("discarding unreadable session file: {}", err);
                    None
                }
            },
            Err(_) => None,
        };
        let mut state = self.state.lock().unwrap();
        *state = match restored {
            Some(session) => State::Active(session),
            None => State::Anonymous,
        };
    }

    pub fn login(&self, session: Session) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        match serde_json::to_string(&session) {
            Ok(raw) => {
                if let Err(err) = fs::write(&self.path, raw) {
                    log::warn!("failed to persist session: {}", err);
                }
            }
            Err(err) => log::warn!("failed to serialize session: {}", err),
        }
        let mut state = self.state.lock().unwrap();
        *state = State::Active(session);
    }

    pub fn logout(&self) {
        let _ = fs::remove_file(&self.path);
        let mut state = self.state.lock().unwrap();
        *state = State::Anonymous;
    }

    pub fn current(&self) -> Option<Session> {
        match &*self.state.lock().unwrap() {
            State::Active(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match &*self.state.lock().unwrap() {
            State::Unresolved => SessionStatus::Loading,
            State::Anonymous => SessionStatus::Unauthenticated,
            State::Active(_) => SessionStatus::Authenticated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "t".to_string(),
            user: User {
                id: None,
                email: "admin@example.com".to_string(),
                name: "Admin".to_string(),
            },
        }
    }

    #[test]
    fn starts_loading_until_restored() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(&dir.path().join("session.json"));
        assert_eq!(store.status(), SessionStatus::Loading);
        assert_eq!(store.current(), None);
        store.restore();
        assert_eq!(store.status(), SessionStatus::Unauthenticated);
    }

    #[test]
    fn login_persists_across_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(&path);
        store.restore();
        store.login(session());
        assert_eq!(store.status(), SessionStatus::Authenticated);

        let reopened = SessionStore::open(&path);
        reopened.restore();
        assert_eq!(reopened.status(), SessionStatus::Authenticated);
        assert_eq!(reopened.current().unwrap().user.name, "Admin");
    }

    #[test]
    fn logout_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(&path);
        store.restore();
        store.login(session());
        store.logout();
        assert_eq!(store.status(), SessionStatus::Unauthenticated);
        assert!(!path.exists());

        let reopened = SessionStore::open(&path);
        reopened.restore();
        assert_eq!(reopened.status(), SessionStatus::Unauthenticated);
    }

    #[test]
    fn corrupt_file_resolves_to_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let store = SessionStore::open(&path);
        store.restore();
        assert_eq!(store.status(), SessionStatus::Unauthenticated);
    }

    #[test]
    fn login_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state/session.json");

        let store = SessionStore::open(&path);
        store.restore();
        store.login(session());
        assert!(path.exists());
    }
}
