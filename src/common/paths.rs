//! Configuration file locations

use std::io;
use std::path::PathBuf;

/// Application name used for platform directories
const APP_NAME: &str = "webprobe";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/webprobe/`
/// - macOS: `~/Library/Application Support/webprobe/`
/// - Windows: `%APPDATA%\webprobe\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the user-level configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to a configuration file in the working directory, if any
pub fn local_config_path() -> Option<PathBuf> {
    let path = PathBuf::from("webprobe.toml");
    path.exists().then_some(path)
}

/// Ensure the configuration directory exists
pub fn ensure_config_dir() -> io::Result<Option<PathBuf>> {
    if let Some(dir) = config_dir() {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Some(dir))
    } else {
        Ok(None)
    }
}
