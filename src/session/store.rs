//! Persisted session
//!
//! Stored as `session.json` in the data directory and rewritten whenever
//! it changes. Only the login flag, the remembered email, the last page and
//! the login time survive a restart; filters and selection do not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::auth::Credentials;
use super::error::{SessionError, SessionResult};
use super::state::Page;

/// What goes on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remembered_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_page: Option<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_in_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    #[serde(flatten)]
    data: SessionData,
}

/// Login flag and preferences backed by a JSON file
#[derive(Debug)]
pub struct SessionStore {
    data: SessionData,
    path: PathBuf,
    dirty: bool,
    enabled: bool,
}

impl SessionStore {
    /// Open the store in `data_dir`, loading any previous session
    ///
    /// An unreadable session file is logged and replaced by a fresh session.
    pub fn open(data_dir: &Path) -> SessionResult<Self> {
        let path = data_dir.join("session.json");

        let data = if path.exists() {
            match Self::load_from_file(&path) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Discarding unreadable session file");
                    SessionData::default()
                }
            }
        } else {
            SessionData::default()
        };

        Ok(Self {
            data,
            path,
            dirty: false,
            enabled: true,
        })
    }

    /// A store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            data: SessionData::default(),
            path: PathBuf::new(),
            dirty: false,
            enabled: false,
        }
    }

    fn load_from_file(path: &Path) -> SessionResult<SessionData> {
        let file = File::open(path).map_err(|e| SessionError::io(path, e))?;
        let reader = BufReader::new(file);
        let stored: SessionFile = serde_json::from_reader(reader).map_err(|e| {
            SessionError::Serialization(format!("Failed to load session: {}", e))
        })?;
        Ok(stored.data)
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn is_logged_in(&self) -> bool {
        self.data.logged_in
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check credentials and mark the session logged in
    ///
    /// The email is remembered only when `remember` is set; otherwise any
    /// previously remembered email is forgotten.
    pub fn login(
        &mut self,
        credentials: &Credentials,
        email: &str,
        password: &str,
        remember: bool,
    ) -> SessionResult<()> {
        credentials.authenticate(email, password)?;

        self.data.logged_in = true;
        self.data.logged_in_at = Some(Utc::now());
        self.data.remembered_email = remember.then(|| email.trim().to_string());
        self.dirty = true;
        self.persist()?;

        tracing::info!(remember, "Logged in");
        Ok(())
    }

    /// Clear the login flag, keeping remembered email and last page
    pub fn logout(&mut self) -> SessionResult<()> {
        if self.data.logged_in {
            self.data.logged_in = false;
            self.data.logged_in_at = None;
            self.dirty = true;
        }
        self.persist()
    }

    /// Remember the page for the next login; deep dives are never restored
    pub fn set_last_page(&mut self, page: Page) -> SessionResult<()> {
        if page.is_deep_dive() {
            return Ok(());
        }
        if self.data.last_page != Some(page) {
            self.data.last_page = Some(page);
            self.dirty = true;
        }
        self.persist()
    }

    /// Write the session to disk if it changed
    pub fn persist(&mut self) -> SessionResult<()> {
        if !self.enabled || !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::io(parent, e))?;
        }

        let stored = SessionFile {
            version: 1,
            data: self.data.clone(),
        };

        let file = File::create(&self.path).map_err(|e| SessionError::io(&self.path, e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &stored).map_err(|e| {
            SessionError::Serialization(format!("Failed to persist session: {}", e))
        })?;

        self.dirty = false;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether changes reach disk at all
    pub fn is_persistent(&self) -> bool {
        self.enabled
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        if self.enabled && self.dirty {
            let _ = self.persist();
        }
    }
}
