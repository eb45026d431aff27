//! In-memory host: documents, editors and the surface that owns them.
//!
//! The CLI opens every file it processes as a [`MemoryDocument`] and drives
//! the controller through a [`Workspace`]. Tests use the same types as a
//! host without a real editor.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::host::{
    EditError, EditorSurface, EditorView, MessageLevel, Position, TextDocument, TextEdit,
};
use crate::translate::{EditorSettings, HostEditorOptions};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One line of a document and the terminator that ends it.
///
/// Only the last line of a document has an empty terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    content: String,
    ending: &'static str,
}

/// Split text into lines.
///
/// `\r\n`, `\n` and a lone `\r` all end a line. Text ending in a terminator
/// has a trailing empty line, and empty text is one empty line.
fn split_lines(text: &str) -> Vec<Line> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let ending = match bytes[i] {
            b'\n' => "\n",
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => "\r\n",
            b'\r' => "\r",
            _ => {
                i += 1;
                continue;
            }
        };
        lines.push(Line {
            content: text[start..i].to_string(),
            ending,
        });
        i += ending.len();
        start = i;
    }
    lines.push(Line {
        content: text[start..].to_string(),
        ending: "",
    });
    lines
}

/// Byte offset of character `at.character` within `content`.
fn byte_offset(content: &str, at: Position) -> Result<usize, EditError> {
    if at.character == content.chars().count() {
        return Ok(content.len());
    }
    content
        .char_indices()
        .nth(at.character)
        .map(|(offset, _)| offset)
        .ok_or(EditError::ColumnOutOfRange {
            line: at.line,
            character: at.character,
        })
}

/// A document whose text lives in memory, stored line by line.
///
/// Reading a line and editing within a line cost time proportional to that
/// line, not to the whole document. `save` writes to disk only when the
/// document has a path and persistence is enabled; otherwise it just records
/// the save.
pub struct MemoryDocument {
    path: Option<PathBuf>,
    lines: Mutex<Vec<Line>>,
    persist: bool,
    edit_batches: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryDocument {
    pub fn new(path: impl Into<PathBuf>, text: impl AsRef<str>) -> Self {
        Self {
            path: Some(path.into()),
            lines: Mutex::new(split_lines(text.as_ref())),
            persist: true,
            edit_batches: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn untitled(text: impl AsRef<str>) -> Self {
        Self {
            path: None,
            ..Self::new(PathBuf::new(), text)
        }
    }

    /// Keep saves in memory instead of writing the file.
    pub fn dry_run(mut self) -> Self {
        self.persist = false;
        self
    }

    pub fn text(&self) -> String {
        let lines = lock(&self.lines);
        let mut text = String::with_capacity(
            lines
                .iter()
                .map(|l| l.content.len() + l.ending.len())
                .sum(),
        );
        for line in lines.iter() {
            text.push_str(&line.content);
            text.push_str(line.ending);
        }
        text
    }

    /// Number of edit batches applied so far.
    pub fn edit_batches(&self) -> usize {
        self.edit_batches.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextDocument for MemoryDocument {
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn line_count(&self) -> usize {
        lock(&self.lines).len()
    }

    fn line(&self, index: usize) -> Option<String> {
        lock(&self.lines).get(index).map(|l| l.content.clone())
    }

    async fn apply_edits(&self, edits: Vec<TextEdit>) -> Result<(), EditError> {
        let mut lines = lock(&self.lines);

        // Resolve every edit before touching the text so a bad batch changes nothing.
        let mut ranges = Vec::with_capacity(edits.len());
        for edit in &edits {
            let (line, from, to, replacement) = match edit {
                TextEdit::Insert { at, text } => (at.line, *at, *at, text.as_str()),
                TextEdit::Delete { start, end } => {
                    if start.line != end.line {
                        return Err(EditError::MultiLine {
                            start: *start,
                            end: *end,
                        });
                    }
                    (start.line, *start, *end, "")
                }
            };
            let content = &lines
                .get(line)
                .ok_or(EditError::LineOutOfRange {
                    line,
                    line_count: lines.len(),
                })?
                .content;
            let from = byte_offset(content, from)?;
            let to = byte_offset(content, to)?;
            ranges.push((line, from.min(to), from.max(to), replacement));
        }

        // Right to left, so earlier offsets stay valid.
        ranges.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
        let mut broken = Vec::new();
        for (line, from, to, replacement) in ranges {
            lines[line].content.replace_range(from..to, replacement);
            if replacement.contains(['\r', '\n']) && broken.last() != Some(&line) {
                broken.push(line);
            }
        }

        // Lines that gained terminators are split again, bottom up.
        for line in broken {
            let Line { content, ending } = lines[line].clone();
            let mut pieces = split_lines(&(content + ending));
            if !ending.is_empty() {
                pieces.pop();
            }
            lines.splice(line..=line, pieces);
        }

        self.edit_batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save(&self) -> Result<(), EditError> {
        if self.persist {
            let path = self.path.as_ref().ok_or(EditError::Untitled)?;
            let text = self.text();
            tokio::fs::write(path, text)
                .await
                .map_err(|source| EditError::Save {
                    path: path.clone(),
                    source,
                })?;
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An editor showing a [`MemoryDocument`], remembering the options pushed to it.
pub struct MemoryEditor {
    document: Arc<MemoryDocument>,
    options: Mutex<Option<HostEditorOptions>>,
}

impl MemoryEditor {
    pub fn new(document: Arc<MemoryDocument>) -> Self {
        Self {
            document,
            options: Mutex::new(None),
        }
    }
}

impl EditorView for MemoryEditor {
    fn document(&self) -> Arc<dyn TextDocument> {
        self.document.clone()
    }

    fn options(&self) -> Option<HostEditorOptions> {
        lock(&self.options).clone()
    }

    fn set_options(&self, options: HostEditorOptions) {
        *lock(&self.options) = Some(options);
    }
}

/// The in-memory editor surface.
#[derive(Default)]
pub struct Workspace {
    root: Option<PathBuf>,
    settings: Mutex<EditorSettings>,
    documents: Mutex<Vec<Arc<MemoryDocument>>>,
    editors: Mutex<Vec<Arc<MemoryEditor>>>,
    active: Mutex<Option<Arc<MemoryEditor>>>,
    statuses: Mutex<Vec<String>>,
    messages: Mutex<Vec<(MessageLevel, String)>>,
}

impl Workspace {
    pub fn new(root: Option<PathBuf>, settings: EditorSettings) -> Self {
        Self {
            root,
            settings: Mutex::new(settings),
            ..Self::default()
        }
    }

    /// Open a document without showing it in an editor.
    pub fn open_document(&self, document: Arc<MemoryDocument>) {
        lock(&self.documents).push(document);
    }

    /// Open a document in a visible editor and make that editor active.
    pub fn show_document(&self, document: Arc<MemoryDocument>) -> Arc<MemoryEditor> {
        self.open_document(document.clone());
        let editor = Arc::new(MemoryEditor::new(document));
        lock(&self.editors).push(editor.clone());
        *lock(&self.active) = Some(editor.clone());
        editor
    }

    /// Make an already visible editor active.
    pub fn focus(&self, editor: &Arc<MemoryEditor>) {
        *lock(&self.active) = Some(editor.clone());
    }

    /// Close the editor for `document`, keeping the document open.
    pub fn hide_document(&self, document: &Arc<MemoryDocument>) {
        lock(&self.editors).retain(|e| !Arc::ptr_eq(&e.document, document));
        let mut active = lock(&self.active);
        if active
            .as_ref()
            .is_some_and(|e| Arc::ptr_eq(&e.document, document))
        {
            *active = None;
        }
    }

    pub fn set_editor_settings(&self, settings: EditorSettings) {
        *lock(&self.settings) = settings;
    }

    pub fn status_messages(&self) -> Vec<String> {
        lock(&self.statuses).clone()
    }

    pub fn messages(&self) -> Vec<(MessageLevel, String)> {
        lock(&self.messages).clone()
    }
}

impl EditorSurface for Workspace {
    fn active_editor(&self) -> Option<Arc<dyn EditorView>> {
        lock(&self.active)
            .clone()
            .map(|e| e as Arc<dyn EditorView>)
    }

    fn visible_editor_for(&self, path: &Path) -> Option<Arc<dyn EditorView>> {
        lock(&self.editors)
            .iter()
            .find(|e| e.document.path() == Some(path))
            .cloned()
            .map(|e| e as Arc<dyn EditorView>)
    }

    fn open_documents(&self) -> Vec<Arc<dyn TextDocument>> {
        lock(&self.documents)
            .iter()
            .map(|d| d.clone() as Arc<dyn TextDocument>)
            .collect()
    }

    fn editor_settings(&self) -> EditorSettings {
        lock(&self.settings).clone()
    }

    fn workspace_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }

    fn show_status(&self, message: &str, _duration: Duration) {
        lock(&self.statuses).push(message.to_string());
    }

    fn show_message(&self, level: MessageLevel, message: &str) {
        lock(&self.messages).push((level, message.to_string()));
    }
}
