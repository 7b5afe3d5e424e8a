//! Who is logged in. The user and token live in memory and in a small JSON
//! file so a restart keeps the session.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::cli::api::{ApiError, Client};
use crate::models::{AuthResponse, User};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("session file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    pub fn save(&self, stored: &StoredSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let body = serde_json::to_string(stored).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, body).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn io_error(&self, source: io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

pub struct Session {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
    store: SessionStore,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("loading", &self.loading)
            .finish()
    }
}

impl Session {
    /// Starts in the loading state until [`Session::restore`] runs.
    pub fn new(store: SessionStore) -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
            store,
        }
    }

    pub fn restore(&mut self) {
        match self.store.load() {
            Ok(Some(stored)) => {
                info!(email = %stored.user.email, "session restored");
                self.user = Some(stored.user);
                self.token = Some(stored.token);
            }
            Ok(None) => {}
            Err(e @ SessionError::Corrupt { .. }) => {
                warn!(error = %e, "dropping stored session");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "failed to remove session file");
                }
            }
            Err(e) => warn!(error = %e, "failed to read session"),
        }
        self.loading = false;
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub async fn login(&mut self, api: &Client, email: &str, password: &str) -> Result<(), ApiError> {
        let auth = api.login(email, password).await?;
        self.persist(auth);
        Ok(())
    }

    pub async fn register(&mut self, api: &Client, email: &str, password: &str) -> Result<(), ApiError> {
        let auth = api.register(email, password).await?;
        self.persist(auth);
        Ok(())
    }

    pub fn logout(&mut self) {
        self.user = None;
        self.token = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "failed to remove session file");
        }
        info!("logged out");
    }

    fn persist(&mut self, auth: AuthResponse) {
        let stored = StoredSession {
            user: auth.user,
            token: auth.token,
        };
        // A session that cannot be written still works until exit.
        if let Err(e) = self.store.save(&stored) {
            warn!(error = %e, "failed to store session");
        }
        info!(email = %stored.user.email, "logged in");
        self.user = Some(stored.user);
        self.token = Some(stored.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> StoredSession {
        StoredSession {
            user: User {
                id: "u1".into(),
                email: "ana@example.com".into(),
            },
            token: "tok-1".into(),
        }
    }

    #[test]
    fn restore_reads_saved_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("session.json"));
        store.save(&stored()).unwrap();

        let mut session = Session::new(store);
        assert!(session.is_loading());
        session.restore();
        assert!(!session.is_loading());
        assert_eq!(session.token(), Some("tok-1"));
        assert_eq!(session.user().unwrap().email, "ana@example.com");
    }

    #[test]
    fn corrupt_session_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();

        let mut session = Session::new(SessionStore::new(&path));
        session.restore();
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(SessionStore::new(dir.path().join("none.json")));
        session.restore();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn logout_clears_state_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(&path);
        store.save(&stored()).unwrap();

        let mut session = Session::new(store);
        session.restore();
        session.logout();
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn debug_hides_the_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&stored()).unwrap();
        let mut session = Session::new(store);
        session.restore();
        let shown = format!("{session:?}");
        assert!(!shown.contains("tok-1"));
        assert!(shown.contains("REDACTED"));
    }
}
