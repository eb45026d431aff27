//! Settings merging logic
//!
//! Priority: CLI args > ecapply.toml > defaults

use crate::translate::{EditorSettings, InsertSpacesSetting, TabSizeSetting};

use super::toml_schema::EditorSection;

/// CLI options that can override settings file values.
///
/// Uses `Option<T>` to distinguish "not specified" from "explicitly set".
#[derive(Debug, Default)]
pub struct CliEditorOptions {
    pub tab_size: Option<TabSizeSetting>,
    pub insert_spaces: Option<InsertSpacesSetting>,
    /// If Some(true), act as if the host trims trailing whitespace itself
    pub host_trims: Option<bool>,
}

/// Merge host editor settings from CLI, TOML, and defaults.
pub fn merge_editor_settings(
    cli: &CliEditorOptions,
    toml: Option<&EditorSection>,
) -> EditorSettings {
    let defaults = EditorSettings::default();

    EditorSettings {
        tab_size: cli
            .tab_size
            .clone()
            .or_else(|| toml.and_then(|t| t.tab_size.clone()))
            .unwrap_or(defaults.tab_size),
        insert_spaces: cli
            .insert_spaces
            .clone()
            .or_else(|| toml.and_then(|t| t.insert_spaces.clone()))
            .unwrap_or(defaults.insert_spaces),
        trim_trailing_whitespace: cli
            .host_trims
            .or_else(|| toml.and_then(|t| t.trim_trailing_whitespace))
            .unwrap_or(defaults.trim_trailing_whitespace),
    }
}
