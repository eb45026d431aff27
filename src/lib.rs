pub mod cache;
pub mod colors;
pub mod config;
pub mod controller;
pub mod host;
mod output;
pub mod progress;
pub mod properties;
pub mod transform;
pub mod translate;
pub mod walker;
pub mod workspace;

pub use cache::{ConfigResolutionCache, Resolution, SettingsProvider};
pub use colors::{should_use_colors, Colors};
pub use config::{
    editorconfig_contents, find_settings_file, generate_editorconfig, generate_settings_file_in,
    load_settings, merge_editor_settings, parse_editorconfig, CliEditorOptions, ConfigError,
    ConfigResolver, EditorConfigResolver, GenerateOutcome, ResolveError, SettingsToml,
    SETTINGS_TEMPLATE,
};
pub use controller::{
    apply_editor_options, run_save_pipeline, ApplicationController, EventDispatcher, EventKind,
    HostEvent, SaveOutcome, SkipReason,
};
pub use host::{
    EditError, EditorSurface, EditorView, MessageLevel, Position, TextDocument, TextEdit,
};
pub use output::{print_diff, Config, OutputContext, OutputMode, RunResult};
pub use progress::ProgressReporter;
pub use properties::ResolvedConfig;
pub use transform::{insert_final_newline, run_pipeline, trim_trailing_whitespace, TransformReport};
pub use translate::{
    host_options_to_config_properties, resolve_tab_size, resolve_to_host_options,
    DefaultSettings, EditorSettings, HostEditorOptions, InsertSpacesSetting, TabSizeSetting,
};
pub use walker::walk_paths;
pub use workspace::{MemoryDocument, MemoryEditor, Workspace};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

const BINARY_CHECK_SIZE: usize = 8192;

/// Check if content is binary by looking for null bytes in first 8192 bytes
pub fn is_binary(content: &[u8]) -> bool {
    let check_len = content.len().min(BINARY_CHECK_SIZE);
    content[..check_len].contains(&0)
}

/// A file opened in the workspace, with the path it was given as.
struct OpenFile {
    display: PathBuf,
    document: Arc<MemoryDocument>,
    editor: Arc<MemoryEditor>,
}

/// Main entry point: open every file under `paths` in an in-memory
/// workspace, apply its `.editorconfig` settings and save it.
pub async fn run(paths: &[String], config: &Config, ctx: &OutputContext) -> io::Result<RunResult> {
    let mut result = RunResult::default();

    let workspace = Arc::new(Workspace::new(
        std::env::current_dir().ok(),
        config.settings.clone(),
    ));
    let cache = Arc::new(ConfigResolutionCache::new(
        Arc::new(EditorConfigResolver::new()),
        DefaultSettings::from_host(&config.settings),
    ));
    let controller = ApplicationController::new(workspace.clone(), cache);

    let mut files = Vec::new();
    for path in walk_paths(paths) {
        let path = path?;
        match open_file(&path, config, ctx) {
            Ok(Some(document)) => {
                let editor = workspace.show_document(document.clone());
                files.push(OpenFile {
                    display: path,
                    document,
                    editor,
                });
            }
            Ok(None) => {}
            Err(e) => {
                if ctx.mode != OutputMode::Quiet {
                    eprintln!("Error processing {}: {e}", path.display());
                }
            }
        }
    }

    // Configuration files go first so later files see their saved state.
    files.sort_by_key(|f| !f.document.is_config_file());

    controller.dispatch(HostEvent::Activated).await;

    let progress = ProgressReporter::new(files.len() as u64, ctx.show_progress);

    for file in &files {
        progress.start(&file.display);

        workspace.focus(&file.editor);
        controller.dispatch(HostEvent::ActiveEditorChanged).await;
        if ctx.verbose {
            if let Some(options) = file.editor.options() {
                output::print_options(&file.display, &options, ctx);
            }
        }

        let original = file.document.text();
        match controller.on_document_saved(&*file.document).await {
            Ok(SaveOutcome::Saved(report)) if report.has_changes() => {
                if config.check_only {
                    result.files_with_problems += 1;
                    output::print_check_result(&file.display, &report, ctx);
                } else {
                    result.files_fixed += 1;
                    output::print_fix_result(&file.display, &original, &file.document.text(), ctx);
                }
            }
            Ok(SaveOutcome::Saved(_)) => {
                if ctx.verbose {
                    output::print_checked(&file.display, ctx);
                }
            }
            Ok(SaveOutcome::Skipped(reason)) => {
                result.files_without_config += 1;
                if ctx.verbose {
                    output::print_skipped(&file.display, skip_label(reason), ctx);
                }
            }
            Err(e) => {
                warn!(path = %file.display.display(), error = %e, "save pipeline failed");
                if ctx.mode != OutputMode::Quiet {
                    eprintln!("Error processing {}: {e}", file.display.display());
                }
            }
        }

        progress.finish_one();
    }

    progress.finish();

    output::print_summary(&result, config, ctx);

    Ok(result)
}

fn skip_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::Untitled => "untitled",
        SkipReason::NoConfiguration => "no editorconfig",
        SkipReason::NoVisibleEditor => "not open",
    }
}

/// Read `path` into a document, or `None` if it should not be touched.
fn open_file(
    path: &Path,
    config: &Config,
    ctx: &OutputContext,
) -> io::Result<Option<Arc<MemoryDocument>>> {
    let bytes = fs::read(path)?;

    // Skip empty files
    if bytes.is_empty() {
        if ctx.verbose {
            output::print_skipped(path, "empty", ctx);
        }
        return Ok(None);
    }

    // Skip binary files
    if is_binary(&bytes) {
        if ctx.verbose {
            output::print_skipped(path, "binary", ctx);
        }
        return Ok(None);
    }

    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => {
            if ctx.verbose {
                output::print_skipped(path, "non-UTF-8", ctx);
            }
            return Ok(None);
        }
    };

    // The resolver needs an absolute path to walk upward from.
    let absolute = fs::canonicalize(path)?;
    let document = MemoryDocument::new(absolute, content);
    let document = if config.check_only {
        document.dry_run()
    } else {
        document
    };
    Ok(Some(Arc::new(document)))
}
