//! Conversions between `.editorconfig` properties and host editor options.
//!
//! Everything here is pure: no state, no I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::properties::{IndentStyle, ResolvedConfig, INDENT_SIZE, INDENT_STYLE, TAB_WIDTH};

/// Keyword the host uses for "detect from content".
pub const AUTO: &str = "auto";

/// Tab size substituted for [`AUTO`].
pub const AUTO_TAB_SIZE: u32 = 4;

/// Host `tab_size` setting: a number or a keyword such as `"auto"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TabSizeSetting {
    Number(u32),
    Keyword(String),
}

impl From<u32> for TabSizeSetting {
    fn from(n: u32) -> Self {
        TabSizeSetting::Number(n)
    }
}

impl From<&str> for TabSizeSetting {
    fn from(s: &str) -> Self {
        TabSizeSetting::Keyword(s.to_string())
    }
}

/// Host `insert_spaces` setting: a boolean or a keyword such as `"auto"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertSpacesSetting {
    Flag(bool),
    Keyword(String),
}

impl From<bool> for InsertSpacesSetting {
    fn from(b: bool) -> Self {
        InsertSpacesSetting::Flag(b)
    }
}

impl From<&str> for InsertSpacesSetting {
    fn from(s: &str) -> Self {
        InsertSpacesSetting::Keyword(s.to_string())
    }
}

impl fmt::Display for InsertSpacesSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertSpacesSetting::Flag(true) => f.write_str("spaces"),
            InsertSpacesSetting::Flag(false) => f.write_str("tabs"),
            InsertSpacesSetting::Keyword(k) => f.write_str(k),
        }
    }
}

/// Editor-wide settings as the host reports them, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    pub tab_size: TabSizeSetting,
    pub insert_spaces: InsertSpacesSetting,
    /// The host already trims trailing whitespace on save
    pub trim_trailing_whitespace: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            tab_size: TabSizeSetting::Number(AUTO_TAB_SIZE),
            insert_spaces: InsertSpacesSetting::Flag(true),
            trim_trailing_whitespace: false,
        }
    }
}

/// Fallbacks used whenever a per-file property is absent.
///
/// `insert_spaces` keeps the host's keyword, so `"auto"` reaches the editor
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultSettings {
    pub tab_size: u32,
    pub insert_spaces: InsertSpacesSetting,
    pub trim_trailing_whitespace: bool,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self::from_host(&EditorSettings::default())
    }
}

impl DefaultSettings {
    pub fn from_host(settings: &EditorSettings) -> Self {
        Self {
            tab_size: resolve_tab_size(&settings.tab_size).unwrap_or(AUTO_TAB_SIZE),
            insert_spaces: settings.insert_spaces.clone(),
            trim_trailing_whitespace: settings.trim_trailing_whitespace,
        }
    }
}

/// Options pushed to a live editor view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEditorOptions {
    pub tab_size: u32,
    pub insert_spaces: InsertSpacesSetting,
}

impl fmt::Display for HostEditorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Indentation: {} ({})", self.insert_spaces, self.tab_size)
    }
}

/// Compute the options for an editor showing a file with `config`.
///
/// `tab_width` wins over `indent_size`, which wins over the host default.
/// Without `indent_style` the host's `insert_spaces` is passed through as is.
pub fn resolve_to_host_options(
    config: &ResolvedConfig,
    defaults: &DefaultSettings,
) -> HostEditorOptions {
    let insert_spaces = match config.indent_style() {
        Some(style) => InsertSpacesSetting::Flag(style == IndentStyle::Space),
        None => defaults.insert_spaces.clone(),
    };

    let tab_size = config
        .tab_width()
        .or_else(|| config.indent_size())
        .unwrap_or(defaults.tab_size);

    HostEditorOptions {
        tab_size,
        insert_spaces,
    }
}

/// Express host settings as `.editorconfig` properties.
///
/// An `insert_spaces` keyword other than `"auto"` yields an empty set. A tab
/// size that does not resolve to a number is left out.
pub fn host_options_to_config_properties(settings: &EditorSettings) -> ResolvedConfig {
    let mut config = ResolvedConfig::new();
    let size = resolve_tab_size(&settings.tab_size);

    let (style, size_key) = match &settings.insert_spaces {
        InsertSpacesSetting::Flag(true) => (IndentStyle::Space, INDENT_SIZE),
        InsertSpacesSetting::Flag(false) => (IndentStyle::Tab, TAB_WIDTH),
        InsertSpacesSetting::Keyword(k) if k == AUTO => (IndentStyle::Tab, TAB_WIDTH),
        InsertSpacesSetting::Keyword(_) => return config,
    };

    config.set(INDENT_STYLE, style.as_str());
    if let Some(size) = size {
        config.set(size_key, size.to_string());
    }
    config
}

/// `"auto"` maps to [`AUTO_TAB_SIZE`]; anything else is read as base-10.
pub fn resolve_tab_size(tab_size: &TabSizeSetting) -> Option<u32> {
    match tab_size {
        TabSizeSetting::Number(n) => Some(*n),
        TabSizeSetting::Keyword(k) if k == AUTO => Some(AUTO_TAB_SIZE),
        TabSizeSetting::Keyword(k) => k.trim().parse().ok(),
    }
}
