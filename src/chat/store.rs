//! JSON-file persistence for the session collection.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::StoreError;
use super::types::SessionCollection;

/// Default history file name, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "chats.json";

/// Reads and rewrites the whole collection in a single UTF-8 JSON document.
#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Create a store backed by `path`. Nothing is touched until `load`/`save`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the history file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the collection.
    ///
    /// A missing, unreadable, or malformed file yields an empty collection.
    #[must_use]
    pub fn load(&self) -> SessionCollection {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no chat history yet");
                return SessionCollection::new();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "could not read chat history");
                return SessionCollection::new();
            }
        };

        match serde_json::from_str::<SessionCollection>(&content) {
            Ok(sessions) => {
                debug!(path = %self.path.display(), count = sessions.len(), "loaded chat history");
                sessions
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring malformed chat history");
                SessionCollection::new()
            }
        }
    }

    /// Overwrite the file with the full collection.
    ///
    /// The document is written to a sibling temp file and renamed over the
    /// target, so the previous history survives a failed write.
    ///
    /// # Errors
    /// Returns an error if serialization, the write, or the rename fails.
    pub fn save(&self, sessions: &SessionCollection) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(sessions)?;
        let tmp_path = self.tmp_path();

        self.write_file(&tmp_path, json.as_bytes())
            .and_then(|()| fs::rename(&tmp_path, &self.path))
            .map_err(|source| {
                let _ = fs::remove_file(&tmp_path);
                StoreError::Io {
                    path: self.path.clone(),
                    source,
                }
            })?;

        debug!(path = %self.path.display(), count = sessions.len(), "saved chat history");
        Ok(())
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| DEFAULT_DATA_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
