//! Template generation for `--init` and `--init-settings`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::host::EDITORCONFIG_FILE;
use crate::properties::{INDENT_SIZE, INDENT_STYLE, TAB_WIDTH};
use crate::translate::{host_options_to_config_properties, EditorSettings};

use super::file::SETTINGS_FILE;

/// Template ecapply.toml with documentation
pub const SETTINGS_TEMPLATE: &str = r#"# ecapply.toml - Editor-wide defaults for ecapply
#
# These settings play the role of the editor's own configuration. They are
# used whenever a file's .editorconfig does not say otherwise, and they are
# what `ecapply --init` writes into a new .editorconfig.

[editor]
# Width of a tab / indentation level. A number or "auto" (treated as 4).
# tab_size = 4

# Indent with spaces (true) or tabs (false). "auto" is treated as tabs when
# generating a .editorconfig.
# insert_spaces = true

# Set when the editor already trims trailing whitespace on save; ecapply then
# leaves trimming to it.
# trim_trailing_whitespace = false
"#;

/// Result of the generate-configuration-file command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    Created(PathBuf),
    /// There is no workspace root to write into
    NoWorkspace,
    AlreadyExists(PathBuf),
}

/// Contents of a new root `.editorconfig` reflecting `settings`.
pub fn editorconfig_contents(settings: &EditorSettings) -> String {
    let properties = host_options_to_config_properties(settings);
    let mut out = String::from("root = true\n\n[*]\n");

    for key in [INDENT_STYLE, INDENT_SIZE, TAB_WIDTH] {
        if let Some(value) = properties.get(key) {
            out.push_str(&format!("{key} = {value}\n"));
        }
    }
    out
}

/// Write `.editorconfig` at `root` unless one already exists.
pub fn generate_editorconfig(
    root: Option<&Path>,
    settings: &EditorSettings,
) -> io::Result<GenerateOutcome> {
    let Some(root) = root else {
        return Ok(GenerateOutcome::NoWorkspace);
    };

    let path = root.join(EDITORCONFIG_FILE);
    if path.exists() {
        return Ok(GenerateOutcome::AlreadyExists(path));
    }

    fs::write(&path, editorconfig_contents(settings))?;
    Ok(GenerateOutcome::Created(path))
}

/// Generate ecapply.toml in the specified directory (or current directory if None).
///
/// Returns an error if ecapply.toml already exists.
pub fn generate_settings_file_in(dir: Option<&Path>) -> io::Result<PathBuf> {
    let path = dir.map_or_else(|| PathBuf::from(SETTINGS_FILE), |d| d.join(SETTINGS_FILE));

    if path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{SETTINGS_FILE} already exists"),
        ));
    }

    fs::write(&path, SETTINGS_TEMPLATE)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{InsertSpacesSetting, TabSizeSetting};
    use tempfile::TempDir;

    fn settings(tab_size: TabSizeSetting, insert_spaces: InsertSpacesSetting) -> EditorSettings {
        EditorSettings {
            tab_size,
            insert_spaces,
            trim_trailing_whitespace: false,
        }
    }

    #[test]
    fn test_editorconfig_contents_spaces() {
        let content = editorconfig_contents(&settings(2.into(), true.into()));
        assert_eq!(
            content,
            "root = true\n\n[*]\nindent_style = space\nindent_size = 2\n"
        );
    }

    #[test]
    fn test_editorconfig_contents_tabs() {
        let content = editorconfig_contents(&settings("auto".into(), false.into()));
        assert_eq!(
            content,
            "root = true\n\n[*]\nindent_style = tab\ntab_width = 4\n"
        );
    }

    #[test]
    fn test_editorconfig_contents_unknown_style() {
        let content = editorconfig_contents(&settings(4.into(), "never".into()));
        assert_eq!(content, "root = true\n\n[*]\n");
    }

    #[test]
    fn test_generate_editorconfig_creates_file() {
        let dir = TempDir::new().unwrap();

        let outcome = generate_editorconfig(Some(dir.path()), &EditorSettings::default()).unwrap();
        let path = dir.path().join(".editorconfig");
        assert_eq!(outcome, GenerateOutcome::Created(path.clone()));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("root = true"));
        assert!(content.contains("[*]"));
        assert!(content.contains("indent_size = 4"));
    }

    #[test]
    fn test_generate_editorconfig_keeps_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".editorconfig");
        fs::write(&path, "existing").unwrap();

        let outcome = generate_editorconfig(Some(dir.path()), &EditorSettings::default()).unwrap();
        assert_eq!(outcome, GenerateOutcome::AlreadyExists(path.clone()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing");
    }

    #[test]
    fn test_generate_editorconfig_without_workspace() {
        let outcome = generate_editorconfig(None, &EditorSettings::default()).unwrap();
        assert_eq!(outcome, GenerateOutcome::NoWorkspace);
    }

    #[test]
    fn test_generate_editorconfig_write_failure() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        let result = generate_editorconfig(Some(&missing), &EditorSettings::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_generate_settings_file_creates_file() {
        let dir = TempDir::new().unwrap();

        let path = generate_settings_file_in(Some(dir.path())).unwrap();
        assert_eq!(path, dir.path().join(SETTINGS_FILE));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[editor]"));
        assert!(content.contains("tab_size"));
    }

    #[test]
    fn test_generate_settings_file_fails_if_exists() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "existing").unwrap();

        let result = generate_settings_file_in(Some(dir.path()));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn test_template_is_valid_toml() {
        let parsed: Result<super::super::toml_schema::SettingsToml, _> =
            toml::from_str(SETTINGS_TEMPLATE);
        assert!(parsed.is_ok());
    }
}
