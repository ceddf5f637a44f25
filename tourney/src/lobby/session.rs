//! Explicit session state with load/save at process boundaries.

use crate::auth::UserProfile;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// The signed-in user, if any
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    profile: Option<UserProfile>,
}

impl SessionState {
    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            profile: Some(profile),
        }
    }

    /// Load a saved session. A missing file is an empty session; an
    /// unreadable one is discarded.
    pub fn load(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(state) => Ok(state),
            Err(e) => {
                log::warn!("Discarding unreadable session file {}: {}", path.display(), e);
                std::fs::remove_file(path)?;
                Ok(Self::default())
            }
        }
    }

    /// Persist the session, creating parent directories as needed
    pub fn save(&self, path: impl AsRef<Path>) -> SessionResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn uid(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.uid.as_str())
    }

    pub fn is_signed_in(&self) -> bool {
        self.profile.is_some()
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
    }

    pub fn clear(&mut self) {
        self.profile = None;
    }
}
