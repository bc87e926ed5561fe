/*
 * Persists the restoration state of closed windows, one named group per window.
 * A `ClosedWindowItem` only carries a `ConfigGroup` handle; the state itself is
 * read back when the window is reopened and deleted once it has been reopened or
 * permanently discarded.
 *
 * As with the other core services, access goes through a trait
 * (`SessionStoreOperations`) so tests can substitute an in-memory store. The
 * concrete `CoreSessionStore` writes one JSON file per group into a directory.
 */
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const GROUP_FILE_EXTENSION: &str = "json";
pub const CLOSED_ITEMS_SUBFOLDER_NAME: &str = "closeditems";

#[derive(Debug)]
pub enum SessionStoreError {
    Io(io::Error),
    Serde(serde_json::Error),
    InvalidGroupName(String),
}

impl From<io::Error> for SessionStoreError {
    fn from(err: io::Error) -> Self {
        SessionStoreError::Io(err)
    }
}

impl From<serde_json::Error> for SessionStoreError {
    fn from(err: serde_json::Error) -> Self {
        SessionStoreError::Serde(err)
    }
}

impl std::fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStoreError::Io(e) => write!(f, "Session store I/O error: {e}"),
            SessionStoreError::Serde(e) => {
                write!(f, "Session store serialization/deserialization error: {e}")
            }
            SessionStoreError::InvalidGroupName(name) => {
                write!(f, "Invalid session group name: '{name}'")
            }
        }
    }
}

impl std::error::Error for SessionStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionStoreError::Io(e) => Some(e),
            SessionStoreError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionStoreError>;

// Everything needed to bring a closed window back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WindowState {
    pub title: String,
    pub tab_urls: Vec<String>,
    #[serde(default)]
    pub active_tab: usize,
}

pub trait SessionStoreOperations: Send + Sync {
    fn save_group(&self, group_name: &str, state: &WindowState) -> Result<()>;
    fn load_group(&self, group_name: &str) -> Result<Option<WindowState>>;
    fn delete_group(&self, group_name: &str) -> Result<()>;
}

pub fn sanitize_group_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

pub struct CoreSessionStore {
    storage_dir: PathBuf,
}

impl CoreSessionStore {
    pub fn new(storage_dir: PathBuf) -> Self {
        CoreSessionStore { storage_dir }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn group_file_path(&self, group_name: &str) -> Result<PathBuf> {
        let sanitized = sanitize_group_name(group_name);
        if sanitized.is_empty() {
            return Err(SessionStoreError::InvalidGroupName(group_name.to_string()));
        }
        Ok(self
            .storage_dir
            .join(format!("{sanitized}.{GROUP_FILE_EXTENSION}")))
    }
}

impl SessionStoreOperations for CoreSessionStore {
    fn save_group(&self, group_name: &str, state: &WindowState) -> Result<()> {
        log::trace!("CoreSessionStore: Saving group '{group_name}'");
        let file_path = self.group_file_path(group_name)?;
        if !self.storage_dir.exists() {
            fs::create_dir_all(&self.storage_dir)?;
            log::debug!(
                "CoreSessionStore: Created storage directory {:?}",
                self.storage_dir
            );
        }
        let file = File::create(&file_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state)?;
        writer.flush()?;
        log::debug!("CoreSessionStore: Saved group '{group_name}' to {file_path:?}.");
        Ok(())
    }

    fn load_group(&self, group_name: &str) -> Result<Option<WindowState>> {
        log::trace!("CoreSessionStore: Loading group '{group_name}'");
        let file_path = self.group_file_path(group_name)?;
        if !file_path.exists() {
            log::debug!("CoreSessionStore: Group file {file_path:?} does not exist.");
            return Ok(None);
        }
        let reader = BufReader::new(File::open(&file_path)?);
        let state: WindowState = serde_json::from_reader(reader)?;
        Ok(Some(state))
    }

    fn delete_group(&self, group_name: &str) -> Result<()> {
        let file_path = self.group_file_path(group_name)?;
        match fs::remove_file(&file_path) {
            Ok(()) => {
                log::debug!("CoreSessionStore: Deleted group '{group_name}' ({file_path:?}).");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::trace!("CoreSessionStore: Group '{group_name}' was already gone.");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/*
 * Handle to one persisted group. Deleting is best-effort: undo operations are
 * total, so a store failure is logged rather than returned.
 */
#[derive(Clone)]
pub struct ConfigGroup {
    name: String,
    store: Arc<dyn SessionStoreOperations>,
}

impl ConfigGroup {
    pub fn new(name: String, store: Arc<dyn SessionStoreOperations>) -> Self {
        ConfigGroup { name, store }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn load(&self) -> Result<Option<WindowState>> {
        self.store.load_group(&self.name)
    }

    pub fn delete_group(&self) {
        if let Err(e) = self.store.delete_group(&self.name) {
            log::warn!("ConfigGroup: Failed to delete group '{}': {e}", self.name);
        }
    }
}

impl std::fmt::Debug for ConfigGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigGroup")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
