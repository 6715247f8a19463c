use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::db::models::UserRow;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct StoredSession {
    token: Option<String>,
    user: Option<UserRow>,
}

/// Token and identity of the signed-in user.
///
/// Set on login/register, cleared on logout or when the API answers 401.
/// When backed by a file every change is written through immediately.
#[derive(Debug, Default)]
pub struct Session {
    state: StoredSession,
    path: Option<PathBuf>,
}

impl Session {
    /// A session that lives only as long as this value
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the session stored at `path`; a missing file is an empty session
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| SessionError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoredSession::default(),
            Err(source) => return Err(SessionError::Io { path, source }),
        };
        debug!("Loaded session from {}", path.display());
        Ok(Self {
            state,
            path: Some(path),
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    pub fn user(&self) -> Option<&UserRow> {
        self.state.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.token.is_some()
    }

    pub fn establish(&mut self, token: String, user: UserRow) -> Result<(), SessionError> {
        self.state = StoredSession {
            token: Some(token),
            user: Some(user),
        };
        self.persist()
    }

    pub fn clear(&mut self) -> Result<(), SessionError> {
        self.state = StoredSession::default();
        self.persist()
    }

    fn persist(&self) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source: io::Error| SessionError::Io {
            path: path.clone(),
            source,
        };

        if self.state == StoredSession::default() {
            return match fs::remove_file(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(io_err(e)),
                _ => Ok(()),
            };
        }

        let raw = serde_json::to_string_pretty(&self.state).map_err(|source| {
            SessionError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(path, raw).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> UserRow {
        let now = Utc::now();
        UserRow {
            id: 7,
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn persists_and_clears_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = Session::load(&path).unwrap();
        assert!(!session.is_authenticated());

        session.establish("tok".into(), user()).unwrap();
        let reloaded = Session::load(&path).unwrap();
        assert_eq!(reloaded.token(), Some("tok"));
        assert_eq!(reloaded.user().map(|u| u.id), Some(7));

        session.clear().unwrap();
        assert!(!path.exists());
        assert!(!Session::load(&path).unwrap().is_authenticated());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            Session::load(&path),
            Err(SessionError::Corrupt { .. })
        ));
    }

    #[test]
    fn in_memory_session_never_touches_disk() {
        let mut session = Session::in_memory();
        session.establish("tok".into(), user()).unwrap();
        assert!(session.is_authenticated());
        session.clear().unwrap();
        assert_eq!(session.token(), None);
    }
}
