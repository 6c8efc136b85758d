use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt session file: {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write session file: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

/// Operator session: the backend bearer token and the role flag.
///
/// Created once at startup and handed to whatever needs it. When backed by a
/// file, changes are persisted on [`SessionContext::save`].
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    path: Option<PathBuf>,
    state: SessionState,
}

impl SessionContext {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the session stored at `path`. A missing file is an empty session.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => SessionState::default(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| SessionError::Parse {
                    path: path.display().to_string(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionState::default(),
            Err(source) => {
                return Err(SessionError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        debug!(path = %path.display(), authenticated = state.token.is_some(), "session loaded");
        Ok(Self {
            path: Some(path),
            state,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.state.token.as_deref()
    }

    /// Stores a token. Blank input clears it.
    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into().trim().to_string();
        self.state.token = if token.is_empty() { None } else { Some(token) };
    }

    pub fn role(&self) -> Option<&str> {
        self.state.role.as_deref()
    }

    pub fn set_role(&mut self, role: impl Into<String>) {
        let role = role.into().trim().to_string();
        self.state.role = if role.is_empty() { None } else { Some(role) };
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role()
            .map(|r| r.eq_ignore_ascii_case("admin"))
            .unwrap_or(false)
    }

    /// Value for the `Authorization` header, if logged in.
    pub fn bearer(&self) -> Option<String> {
        self.token().map(|t| format!("Bearer {t}"))
    }

    pub fn clear(&mut self) {
        self.state = SessionState::default();
    }

    /// Writes the session back to its file. An empty session removes the
    /// file; an in-memory session is a no-op.
    pub fn save(&self) -> Result<(), SessionError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let write_err = |source| SessionError::Write {
            path: path.display().to_string(),
            source,
        };

        if self.state == SessionState::default() {
            return match std::fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(write_err(e)),
            };
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = serde_json::to_string_pretty(&self.state).map_err(|e| write_err(e.into()))?;
        std::fs::write(path, contents).map_err(write_err)?;
        restrict_permissions(path).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
