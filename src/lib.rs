//! r-ambient library core functionality

pub mod audio;
pub mod catalog;
pub mod config;
pub mod player;
pub mod ui;

use std::path::{Path, PathBuf};

/// Initialize the application directories for `config_path`
pub fn init_app_dirs(config_path: &Path) -> std::io::Result<()> {
    if let Some(config_dir) = config_path.parent() {
        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            std::fs::create_dir_all(config_dir)?;
        }
    }
    Ok(())
}

/// Log file kept next to the config file, since the terminal belongs to the UI.
pub fn log_file_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|dir| dir.join("r-ambient.log"))
        .unwrap_or_else(|| PathBuf::from("r-ambient.log"))
}
