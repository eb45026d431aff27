//! Configuration support for ecapply.
//!
//! This module provides:
//! - `.editorconfig` resolution for individual files
//! - Loading host settings from `ecapply.toml`
//! - Settings file discovery (search upward from current directory)
//! - Merging CLI args, settings file, and defaults
//! - Generating `.editorconfig` and `ecapply.toml` templates

mod editorconfig;
mod file;
mod init;
mod merge;
mod toml_schema;

pub use editorconfig::{
    parse_editorconfig, ConfigResolver, EditorConfigFile, EditorConfigResolver, ResolveError,
    Section,
};
pub use file::{find_settings_file, load_settings, ConfigError, SETTINGS_FILE};
pub use init::{
    editorconfig_contents, generate_editorconfig, generate_settings_file_in, GenerateOutcome,
    SETTINGS_TEMPLATE,
};
pub use merge::{merge_editor_settings, CliEditorOptions};
pub use toml_schema::{EditorSection, SettingsToml};
