use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;

/// On-disk shape of the session file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

/// Explicit session handle passed to whatever needs the bearer token.
/// Clones share the same underlying session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    path: PathBuf,
    inner: Arc<RwLock<Session>>,
}

impl SessionContext {
    /// Loads the session from `path`. A missing file is an empty session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        let session = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<Session>(&raw).map_err(|e| {
                AppError::Session(format!("Malformed session file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No session file at {}, starting signed out", path.display());
                Session::default()
            }
            Err(e) => {
                return Err(AppError::Session(format!(
                    "Cannot read session file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path,
            inner: Arc::new(RwLock::new(session)),
        })
    }

    /// An in-memory session that is never read from disk.
    pub fn ephemeral(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            inner: Arc::new(RwLock::new(Session::default())),
        }
    }

    pub fn save(&self) -> Result<(), AppError> {
        let snapshot = {
            let mut session = self.inner.write();
            session.saved_at = Some(Utc::now());
            session.clone()
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Session(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }
        let raw = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| AppError::Session(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| {
            warn!("Failed to save session to {}: {}", self.path.display(), e);
            AppError::Session(format!("Cannot write session file {}: {}", self.path.display(), e))
        })
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.inner.write().token = Some(token).filter(|t| !t.trim().is_empty());
    }

    pub fn clear(&self) {
        self.inner.write().token = None;
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().token.clone()
    }

    /// Value for the `Authorization` header, if signed in.
    pub fn bearer(&self) -> Option<String> {
        self.token().map(|t| format!("Bearer {}", t))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
