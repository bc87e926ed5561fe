/*
 * Resolves the application's per-user directories: the local configuration
 * directory holding `settings.json`, and the closed-items directory below it
 * where the restoration state of closed windows is kept.
 */
use super::session_store::CLOSED_ITEMS_SUBFOLDER_NAME;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

fn ensure_dir(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        if let Err(e) = fs::create_dir_all(path) {
            log::error!("PathUtils: Failed to create directory {path:?}: {e}");
            return None;
        }
        log::debug!("PathUtils: Created directory: {path:?}");
    } else {
        log::trace!("PathUtils: Directory already exists: {path:?}");
    }
    Some(path.to_path_buf())
}

/*
 * Retrieves the application's local (non-roaming) configuration directory,
 * creating it if necessary. Returns `None` when no home directory can be
 * determined or the directory cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving base app config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|proj_dirs| ensure_dir(proj_dirs.config_local_dir()))
}

pub fn get_closed_items_dir(app_name: &str) -> Option<PathBuf> {
    let base = get_base_app_config_local_dir(app_name)?;
    ensure_dir(&base.join(CLOSED_ITEMS_SUBFOLDER_NAME))
}
