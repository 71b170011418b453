// Session cache: remembers assistant/thread handles across invocations
use crate::errors::{ClaixError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Name used when no session is specified
pub const DEFAULT_SESSION: &str = "default";

/// File holding every named session
pub const SESSIONS_FILE: &str = "sessions.json";

/// Backend conversation context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub assistant_id: String,
    pub thread_id: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(assistant_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            thread_id: thread_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// Persistent mapping from session name to [`Session`]
pub trait SessionStore: Send + Sync {
    /// Look up a session by name
    fn load(&self, name: &str) -> Result<Option<Session>>;

    /// Insert or replace a session
    fn save(&self, name: &str, session: &Session) -> Result<()>;
}

/// On-disk document
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    sessions: BTreeMap<String, Session>,
}

/// JSON-file session store
///
/// Every save re-reads the file, updates one entry and replaces the file
/// through a rename, so concurrent readers never see a partial document.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store backed by `<state_dir>/sessions.json`
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(SESSIONS_FILE),
        }
    }

    /// Get storage file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<SessionFile> {
        let json = match self.read_raw()? {
            Some(json) => json,
            None => return Ok(SessionFile::default()),
        };

        serde_json::from_str(&json)
            .map_err(|e| ClaixError::SessionStore(format!("Failed to parse sessions: {}", e)))
    }

    fn read_raw(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|e| ClaixError::SessionStore(format!("Failed to read sessions: {}", e)))
    }

    /// Current document for a save; an unparseable file is started over
    fn read_for_update(&self) -> Result<SessionFile> {
        let json = match self.read_raw()? {
            Some(json) => json,
            None => return Ok(SessionFile::default()),
        };

        match serde_json::from_str(&json) {
            Ok(file) => Ok(file),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "session cache is corrupt, replacing it"
                );
                Ok(SessionFile::default())
            }
        }
    }

    fn write(&self, file: &SessionFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ClaixError::SessionStore(format!("Failed to create session directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json)
            .map_err(|e| ClaixError::SessionStore(format!("Failed to write sessions: {}", e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| ClaixError::SessionStore(format!("Failed to replace sessions: {}", e)))?;

        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, name: &str) -> Result<Option<Session>> {
        Ok(self.read()?.sessions.remove(name))
    }

    fn save(&self, name: &str, session: &Session) -> Result<()> {
        let mut file = self.read_for_update()?;
        file.sessions.insert(name.to_string(), session.clone());
        self.write(&file)
    }
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, name: &str) -> Result<Option<Session>> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|_| ClaixError::SessionStore("session map poisoned".to_string()))?;
        Ok(sessions.get(name).cloned())
    }

    fn save(&self, name: &str, session: &Session) -> Result<()> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| ClaixError::SessionStore("session map poisoned".to_string()))?;
        sessions.insert(name.to_string(), session.clone());
        Ok(())
    }
}
