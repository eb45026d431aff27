//! Interfaces to the host editor.
//!
//! The engine only sees documents, editor views and the surface that owns
//! them through these traits. [`crate::workspace`] provides an in-memory
//! implementation.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::translate::{EditorSettings, HostEditorOptions};

/// File name of the configuration files the engine resolves.
pub const EDITORCONFIG_FILE: &str = ".editorconfig";

/// A `(line, character)` location. Both are 0-based; `character` counts chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    Insert { at: Position, text: String },
    /// Delete `start..end`; both positions must be on the same line.
    Delete { start: Position, end: Position },
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("line {line} is out of range (document has {line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("column {character} is out of range on line {line}")]
    ColumnOutOfRange { line: usize, character: usize },

    #[error("edits spanning lines are not supported ({start:?} to {end:?})")]
    MultiLine { start: Position, end: Position },

    #[error("document has no path")]
    Untitled,

    #[error("failed to save {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Line-indexed view of an open document.
#[async_trait]
pub trait TextDocument: Send + Sync {
    /// Stable path identity; `None` for untitled buffers.
    fn path(&self) -> Option<&Path>;

    fn line_count(&self) -> usize;

    /// Text of line `index` without its line terminator.
    fn line(&self, index: usize) -> Option<String>;

    /// Apply a batch of edits atomically.
    async fn apply_edits(&self, edits: Vec<TextEdit>) -> Result<(), EditError>;

    async fn save(&self) -> Result<(), EditError>;

    fn is_config_file(&self) -> bool {
        self.path()
            .and_then(Path::file_name)
            .is_some_and(|name| name == EDITORCONFIG_FILE)
    }
}

/// An editor showing a document.
pub trait EditorView: Send + Sync {
    fn document(&self) -> Arc<dyn TextDocument>;

    fn options(&self) -> Option<HostEditorOptions>;

    fn set_options(&self, options: HostEditorOptions);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

/// Everything the controller needs from the host besides individual documents.
pub trait EditorSurface: Send + Sync {
    fn active_editor(&self) -> Option<Arc<dyn EditorView>>;

    /// A visible editor currently showing the document at `path`.
    fn visible_editor_for(&self, path: &Path) -> Option<Arc<dyn EditorView>>;

    fn open_documents(&self) -> Vec<Arc<dyn TextDocument>>;

    /// Editor-wide settings as currently configured in the host.
    fn editor_settings(&self) -> EditorSettings;

    fn workspace_root(&self) -> Option<PathBuf>;

    /// Transient status bar text.
    fn show_status(&self, message: &str, duration: Duration);

    /// A message shown to the user until dismissed.
    fn show_message(&self, level: MessageLevel, message: &str);
}
