//! Save-time transforms driven by a resolved configuration.
//!
//! Each transform scans the document, then issues edits. Nothing is kept
//! between invocations, and running a transform on its own output issues no
//! edits.

use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;
use tracing::{debug, warn};

use crate::host::{EditError, Position, TextDocument, TextEdit};
use crate::properties::ResolvedConfig;
use crate::translate::DefaultSettings;

static TRAILING_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\u{FEFF}\u{A0}]+$").unwrap());

/// What a pipeline run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformReport {
    /// 0-based indices of lines that lost trailing whitespace
    pub trimmed_lines: Vec<usize>,
    /// The newline sequence appended to the last line, if any
    pub inserted_newline: Option<&'static str>,
}

impl TransformReport {
    pub fn has_changes(&self) -> bool {
        !self.trimmed_lines.is_empty() || self.inserted_newline.is_some()
    }
}

/// Char span `(start, end)` of the trailing whitespace on `line`, if any.
pub fn trailing_whitespace_span(line: &str) -> Option<(usize, usize)> {
    let m = TRAILING_WHITESPACE.find(line)?;
    let start = line[..m.start()].chars().count();
    let end = start + m.as_str().chars().count();
    Some((start, end))
}

/// Newline sequence for an `end_of_line` value. Unknown values mean `\n`.
pub fn newline_for(end_of_line: Option<&str>) -> &'static str {
    match end_of_line.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("cr") => "\r",
        Some("crlf") => "\r\n",
        _ => "\n",
    }
}

/// Delete trailing whitespace from every line of `document`.
///
/// Does nothing when the host trims on save itself or the configuration does
/// not ask for trimming. Edits for different lines are issued concurrently;
/// all of them settle before this returns. Returns the trimmed line indices.
pub async fn trim_trailing_whitespace(
    config: &ResolvedConfig,
    defaults: &DefaultSettings,
    document: &dyn TextDocument,
) -> Result<Vec<usize>, EditError> {
    if defaults.trim_trailing_whitespace || !config.trim_trailing_whitespace() {
        return Ok(Vec::new());
    }

    let edits: Vec<(usize, TextEdit)> = (0..document.line_count())
        .filter_map(|index| {
            let line = document.line(index)?;
            let (start, end) = trailing_whitespace_span(&line)?;
            Some((
                index,
                TextEdit::Delete {
                    start: Position::new(index, start),
                    end: Position::new(index, end),
                },
            ))
        })
        .collect();

    if edits.is_empty() {
        return Ok(Vec::new());
    }

    let results = join_all(
        edits
            .iter()
            .map(|(_, edit)| document.apply_edits(vec![edit.clone()])),
    )
    .await;

    let mut trimmed = Vec::with_capacity(edits.len());
    let mut first_error = None;
    for ((index, _), result) in edits.iter().zip(results) {
        match result {
            Ok(()) => trimmed.push(*index),
            Err(e) => {
                warn!(line = index, error = %e, "failed to trim trailing whitespace");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            debug!(lines = trimmed.len(), "trimmed trailing whitespace");
            Ok(trimmed)
        }
    }
}

/// Append one newline to the last line unless it is already empty.
///
/// Returns the sequence that was inserted.
pub async fn insert_final_newline(
    config: &ResolvedConfig,
    document: &dyn TextDocument,
) -> Result<Option<&'static str>, EditError> {
    if !config.insert_final_newline() {
        return Ok(None);
    }

    let line_count = document.line_count();
    if line_count == 0 {
        return Ok(None);
    }

    let last = line_count - 1;
    let Some(text) = document.line(last) else {
        return Ok(None);
    };
    if text.is_empty() {
        return Ok(None);
    }

    let newline = newline_for(config.end_of_line());
    document
        .apply_edits(vec![TextEdit::Insert {
            at: Position::new(last, text.chars().count()),
            text: newline.to_string(),
        }])
        .await?;

    debug!(newline = ?newline, "inserted final newline");
    Ok(Some(newline))
}

/// Run both transforms in order. Trimming finishes before the newline check
/// so whitespace on the last line is gone before it is inspected.
pub async fn run_pipeline(
    config: &ResolvedConfig,
    defaults: &DefaultSettings,
    document: &dyn TextDocument,
) -> Result<TransformReport, EditError> {
    let trimmed_lines = trim_trailing_whitespace(config, defaults, document).await?;
    let inserted_newline = insert_final_newline(config, document).await?;

    Ok(TransformReport {
        trimmed_lines,
        inserted_newline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::MemoryDocument;

    fn config(pairs: &[(&str, &str)]) -> ResolvedConfig {
        pairs.iter().copied().collect()
    }

    fn trim_config() -> ResolvedConfig {
        config(&[("trim_trailing_whitespace", "true")])
    }

    // ===========================================
    // Trailing whitespace
    // ===========================================

    #[test]
    fn test_trailing_whitespace_span() {
        assert_eq!(trailing_whitespace_span("abc  \t"), Some((3, 6)));
        assert_eq!(trailing_whitespace_span("abc"), None);
        assert_eq!(trailing_whitespace_span(""), None);
        assert_eq!(trailing_whitespace_span("héllo\u{A0}\u{FEFF}"), Some((5, 7)));
        assert_eq!(trailing_whitespace_span("   "), Some((0, 3)));
    }

    #[tokio::test]
    async fn test_trim_removes_trailing_whitespace() {
        let doc = MemoryDocument::untitled("hello   \nworld\t\n  indented  \n");
        let trimmed = trim_trailing_whitespace(&trim_config(), &DefaultSettings::default(), &doc)
            .await
            .unwrap();

        assert_eq!(trimmed, vec![0, 1, 2]);
        assert_eq!(doc.text(), "hello\nworld\n  indented\n");
    }

    #[tokio::test]
    async fn test_trim_is_idempotent() {
        let doc = MemoryDocument::untitled("a \nb\t\nc\n");
        let defaults = DefaultSettings::default();

        trim_trailing_whitespace(&trim_config(), &defaults, &doc)
            .await
            .unwrap();
        let batches = doc.edit_batches();

        let second = trim_trailing_whitespace(&trim_config(), &defaults, &doc)
            .await
            .unwrap();
        assert!(second.is_empty());
        assert_eq!(doc.edit_batches(), batches);
    }

    #[tokio::test]
    async fn test_trim_skipped_when_host_trims() {
        let doc = MemoryDocument::untitled("a  \n");
        let defaults = DefaultSettings {
            trim_trailing_whitespace: true,
            ..DefaultSettings::default()
        };

        let trimmed = trim_trailing_whitespace(&trim_config(), &defaults, &doc)
            .await
            .unwrap();
        assert!(trimmed.is_empty());
        assert_eq!(doc.text(), "a  \n");
    }

    #[tokio::test]
    async fn test_trim_skipped_when_disabled() {
        let doc = MemoryDocument::untitled("a  \n");
        let config = config(&[("trim_trailing_whitespace", "false")]);

        trim_trailing_whitespace(&config, &DefaultSettings::default(), &doc)
            .await
            .unwrap();
        assert_eq!(doc.text(), "a  \n");
    }

    #[tokio::test]
    async fn test_trim_preserves_crlf() {
        let doc = MemoryDocument::untitled("a \r\nb\r\n");
        trim_trailing_whitespace(&trim_config(), &DefaultSettings::default(), &doc)
            .await
            .unwrap();
        assert_eq!(doc.text(), "a\r\nb\r\n");
    }

    // ===========================================
    // Final newline
    // ===========================================

    #[test]
    fn test_newline_for() {
        assert_eq!(newline_for(Some("cr")), "\r");
        assert_eq!(newline_for(Some("CRLF")), "\r\n");
        assert_eq!(newline_for(Some("lf")), "\n");
        assert_eq!(newline_for(Some("lf2")), "\n");
        assert_eq!(newline_for(None), "\n");
    }

    #[tokio::test]
    async fn test_insert_final_newline_when_missing() {
        let doc = MemoryDocument::untitled("hello");
        let config = config(&[("insert_final_newline", "true")]);

        let inserted = insert_final_newline(&config, &doc).await.unwrap();
        assert_eq!(inserted, Some("\n"));
        assert_eq!(doc.text(), "hello\n");
    }

    #[tokio::test]
    async fn test_insert_final_newline_mixed_case_crlf() {
        let doc = MemoryDocument::untitled("a\r\nb");
        let config = config(&[("insert_final_newline", "true"), ("end_of_line", "CRLF")]);

        insert_final_newline(&config, &doc).await.unwrap();
        assert_eq!(doc.text(), "a\r\nb\r\n");
    }

    #[tokio::test]
    async fn test_insert_final_newline_unknown_eol_uses_lf() {
        let doc = MemoryDocument::untitled("a");
        let config = config(&[("insert_final_newline", "true"), ("end_of_line", "lf2")]);

        insert_final_newline(&config, &doc).await.unwrap();
        assert_eq!(doc.text(), "a\n");
    }

    #[tokio::test]
    async fn test_no_newline_when_last_line_empty() {
        let doc = MemoryDocument::untitled("hello\n");
        let config = config(&[("insert_final_newline", "true")]);

        let inserted = insert_final_newline(&config, &doc).await.unwrap();
        assert_eq!(inserted, None);
        assert_eq!(doc.text(), "hello\n");
        assert_eq!(doc.edit_batches(), 0);
    }

    #[tokio::test]
    async fn test_no_newline_for_empty_document() {
        let doc = MemoryDocument::untitled("");
        let config = config(&[("insert_final_newline", "true")]);

        assert_eq!(insert_final_newline(&config, &doc).await.unwrap(), None);
        assert_eq!(doc.text(), "");
    }

    #[tokio::test]
    async fn test_no_newline_when_disabled() {
        let doc = MemoryDocument::untitled("hello");
        assert_eq!(
            insert_final_newline(&ResolvedConfig::new(), &doc)
                .await
                .unwrap(),
            None
        );
    }

    // ===========================================
    // Pipeline ordering
    // ===========================================

    #[tokio::test]
    async fn test_pipeline_trims_before_newline() {
        // Whitespace-only last line: trimming empties it, so no newline is added.
        let doc = MemoryDocument::untitled("code\n   ");
        let config = config(&[
            ("trim_trailing_whitespace", "true"),
            ("insert_final_newline", "true"),
        ]);

        let report = run_pipeline(&config, &DefaultSettings::default(), &doc)
            .await
            .unwrap();

        assert_eq!(doc.text(), "code\n");
        assert_eq!(report.trimmed_lines, vec![1]);
        assert_eq!(report.inserted_newline, None);
    }

    #[tokio::test]
    async fn test_pipeline_trims_last_line_then_appends() {
        let doc = MemoryDocument::untitled("a\nb  ");
        let config = config(&[
            ("trim_trailing_whitespace", "true"),
            ("insert_final_newline", "true"),
            ("end_of_line", "cr"),
        ]);

        let report = run_pipeline(&config, &DefaultSettings::default(), &doc)
            .await
            .unwrap();

        assert_eq!(doc.text(), "a\nb\r");
        assert!(report.has_changes());
    }
}
