//! TOML schema definitions for ecapply.toml

use serde::{Deserialize, Serialize};

use crate::translate::{InsertSpacesSetting, TabSizeSetting};

/// Root structure for ecapply.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SettingsToml {
    /// Editor-wide defaults
    #[serde(default)]
    pub editor: EditorSection,
}

/// `[editor]` section in ecapply.toml
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EditorSection {
    /// Tab size: a number or "auto"
    pub tab_size: Option<TabSizeSetting>,

    /// Indent with spaces: a bool or "auto"
    pub insert_spaces: Option<InsertSpacesSetting>,

    /// The host already trims trailing whitespace on save
    pub trim_trailing_whitespace: Option<bool>,
}
