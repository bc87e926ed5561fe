/*
 * Manages the application settings the undo machinery reads: how many closed
 * items to remember and whether file-operation undo is offered at all. Settings
 * are stored as `settings.json` in the platform local configuration directory.
 *
 * It uses a trait-based approach (`ConfigManagerOperations`) so tests and other
 * storage backends can stand in for the file-backed `CoreConfigManager`. Consumers
 * that only need to read the limits depend on the narrower `UndoSettingsProvider`.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

const SETTINGS_FILENAME: &str = "settings.json";
pub const DEFAULT_MAX_NUM_CLOSED_ITEMS: u32 = 20;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoProjectDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration file format error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine directory for configuration")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

// Read-only view of the limits the closed-items lists are bounded by.
pub trait UndoSettingsProvider: Send + Sync {
    fn max_num_closed_items(&self) -> usize;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub max_num_closed_items: u32,
    pub supports_file_undo: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            max_num_closed_items: DEFAULT_MAX_NUM_CLOSED_ITEMS,
            supports_file_undo: true,
        }
    }
}

impl UndoSettingsProvider for AppSettings {
    // A list that cannot hold a single item would make every insert evict itself.
    fn max_num_closed_items(&self) -> usize {
        self.max_num_closed_items.max(1) as usize
    }
}

pub trait ConfigManagerOperations: Send + Sync {
    fn load_settings(&self, app_name: &str) -> Result<AppSettings>;
    fn save_settings(&self, app_name: &str, settings: &AppSettings) -> Result<()>;
}

pub struct CoreConfigManager {
    config_dir_override: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {
            config_dir_override: None,
        }
    }

    // Stores settings in `config_dir` instead of the platform directory.
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        CoreConfigManager {
            config_dir_override: Some(config_dir),
        }
    }

    fn resolve_config_dir(&self, app_name: &str) -> Result<PathBuf> {
        match &self.config_dir_override {
            Some(dir) => {
                if !dir.exists() {
                    std::fs::create_dir_all(dir)?;
                }
                Ok(dir.clone())
            }
            None => path_utils::get_base_app_config_local_dir(app_name)
                .ok_or(ConfigError::NoProjectDirectory),
        }
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    /*
     * Loads the settings for a given application from `settings.json` in the
     * directory returned by `path_utils::get_base_app_config_local_dir` (or the
     * override directory). A missing file is not an error: the defaults are returned.
     */
    fn load_settings(&self, app_name: &str) -> Result<AppSettings> {
        log::trace!("CoreConfigManager: Loading settings for app '{app_name}'");
        let config_dir = self.resolve_config_dir(app_name)?;
        let file_path = config_dir.join(SETTINGS_FILENAME);

        if !file_path.exists() {
            log::debug!("CoreConfigManager: Settings file {file_path:?} does not exist, using defaults.");
            return Ok(AppSettings::default());
        }

        let reader = BufReader::new(File::open(&file_path)?);
        let settings: AppSettings = serde_json::from_reader(reader)?;
        log::debug!("CoreConfigManager: Loaded {settings:?} from {file_path:?}.");
        Ok(settings)
    }

    fn save_settings(&self, app_name: &str, settings: &AppSettings) -> Result<()> {
        log::trace!("CoreConfigManager: Saving {settings:?} for app '{app_name}'");
        let config_dir = self.resolve_config_dir(app_name)?;
        let file_path = config_dir.join(SETTINGS_FILENAME);

        let mut writer = BufWriter::new(File::create(&file_path)?);
        serde_json::to_writer_pretty(&mut writer, settings)?;
        writer.flush()?;
        log::debug!("CoreConfigManager: Saved settings to {file_path:?}.");
        Ok(())
    }
}
