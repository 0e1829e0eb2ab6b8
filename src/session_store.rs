//! Persistence of the authenticated session (token, expiry, device list).
//!
//! The client treats the store as a write-through cache it does not own:
//! failed writes are logged and otherwise ignored, unreadable state loads as
//! nothing.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use crate::rituals::models::Device;

/// What gets handed to the host's storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub devices: Vec<Device>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Option<StoredSession>;
    async fn save(&self, session: &StoredSession);
}

/// Keeps the session for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: RwLock<Option<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Option<StoredSession> {
        self.inner.read().await.clone()
    }

    async fn save(&self, session: &StoredSession) {
        *self.inner.write().await = Some(session.clone());
    }
}

/// Writes the session as pretty-printed JSON to a single file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Option<StoredSession> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "session_store: nothing to load");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session_store: ignoring corrupt session file");
                None
            }
        }
    }

    async fn save(&self, session: &StoredSession) {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if let Err(e) = fs::create_dir_all(dir).await {
                warn!(path = %self.path.display(), error = %e, "session_store: failed to create directory");
                return;
            }
        }

        let content = match serde_json::to_vec_pretty(session) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, "session_store: failed to serialise session");
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, &content).await {
            warn!(path = %self.path.display(), error = %e, "session_store: failed to write session file");
        } else {
            debug!(path = %self.path.display(), bytes = content.len(), "session_store: saved");
        }
    }
}
