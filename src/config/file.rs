//! Settings file discovery and loading

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::toml_schema::SettingsToml;

/// Name of the host settings file.
pub const SETTINGS_FILE: &str = "ecapply.toml";

/// Error type for settings loading
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the file
    #[error("failed to read settings file: {0}")]
    Io(#[from] io::Error),
    /// TOML parsing error
    #[error("failed to parse settings file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Find ecapply.toml by searching upward from the given directory.
///
/// Stops at the first `ecapply.toml` found, or at the git repository root
/// (directory containing `.git`), whichever comes first.
pub fn find_settings_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let file_path = current.join(SETTINGS_FILE);
        if file_path.is_file() {
            return Some(file_path);
        }

        if current.join(".git").exists() {
            return None;
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load and parse ecapply.toml from the given path.
pub fn load_settings(path: &Path) -> Result<SettingsToml, ConfigError> {
    let content = fs::read_to_string(path)?;
    let settings: SettingsToml = toml::from_str(&content)?;
    Ok(settings)
}
