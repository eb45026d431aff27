use crate::colors::Colors;
use crate::transform::TransformReport;
use crate::translate::{EditorSettings, HostEditorOptions};
use similar::{ChangeTag, TextDiff};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Normal,
    Quiet,
    Diff,
}

pub struct Config {
    pub check_only: bool,
    pub output_mode: OutputMode,
    /// The host's own editor settings, merged from CLI and ecapply.toml
    pub settings: EditorSettings,
}

pub struct OutputContext {
    pub mode: OutputMode,
    pub colors: Colors,
    pub verbose: bool,
    pub show_progress: bool,
}

impl OutputContext {
    pub fn new(mode: OutputMode, use_colors: bool, verbose: bool, show_progress: bool) -> Self {
        Self {
            mode,
            colors: Colors::new(use_colors),
            verbose,
            show_progress,
        }
    }
}

#[derive(Debug, Default)]
pub struct RunResult {
    pub files_fixed: usize,
    pub files_with_problems: usize,
    /// Files left alone because no configuration applied to them
    pub files_without_config: usize,
}

impl RunResult {
    pub fn has_problems(&self) -> bool {
        self.files_with_problems > 0
    }
}

fn newline_name(newline: &str) -> &'static str {
    match newline {
        "\r\n" => "crlf",
        "\r" => "cr",
        _ => "lf",
    }
}

pub fn print_check_result(path: &Path, report: &TransformReport, ctx: &OutputContext) {
    if ctx.mode == OutputMode::Quiet {
        println!("{}", path.display());
        return;
    }

    println!("{} {}", ctx.colors.paint(ctx.colors.error, "Error:"), path.display());

    for line in &report.trimmed_lines {
        println!("  - trailing whitespace at line {}", line + 1);
    }
    if let Some(newline) = report.inserted_newline {
        println!("  - missing final newline ({})", newline_name(newline));
    }
}

pub fn print_fix_result(path: &Path, original: &str, content: &str, ctx: &OutputContext) {
    match ctx.mode {
        OutputMode::Quiet => println!("{}", path.display()),
        OutputMode::Diff => print_diff(&path.display().to_string(), original, content),
        OutputMode::Normal => {
            println!("{} {}", ctx.colors.paint(ctx.colors.success, "Fixed:"), path.display());
        }
    }
}

pub fn print_options(path: &Path, options: &HostEditorOptions, ctx: &OutputContext) {
    if ctx.mode == OutputMode::Quiet {
        return;
    }
    println!(
        "{} {} ({options})",
        ctx.colors.paint(ctx.colors.info, "Options:"),
        path.display()
    );
}

pub fn print_checked(path: &Path, ctx: &OutputContext) {
    if ctx.mode == OutputMode::Quiet {
        return;
    }
    println!("{} {}", ctx.colors.paint(ctx.colors.info, "Checked:"), path.display());
}

pub fn print_skipped(path: &Path, reason: &str, ctx: &OutputContext) {
    if ctx.mode == OutputMode::Quiet {
        return;
    }
    println!(
        "{} {}",
        ctx.colors.paint(ctx.colors.info, format!("Skipping {reason}:")),
        path.display()
    );
}

/// Print a unified diff of `original` against `content`.
///
/// Line endings are shown escaped so carriage return changes stay visible.
pub fn print_diff(label: &str, original: &str, content: &str) {
    let diff = TextDiff::from_lines(original, content);

    println!("--- {label}");
    println!("+++ {label}");

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            println!();
        }

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                let value = change.value();
                let body = value.trim_end_matches(['\r', '\n']);
                let ending = &value[body.len()..];
                match ending {
                    "\n" => println!("{sign}{body}"),
                    "" => println!("{sign}{body}\n\\ No newline at end of file"),
                    other => println!("{sign}{body}{}", other.escape_default()),
                }
            }
        }
    }
}

pub fn print_summary(result: &RunResult, config: &Config, ctx: &OutputContext) {
    if ctx.mode == OutputMode::Quiet {
        return;
    }

    if config.check_only {
        if result.files_with_problems > 0 {
            println!();
            println!(
                "{}",
                ctx.colors.paint(
                    ctx.colors.error,
                    format!("{} files with problems", result.files_with_problems)
                )
            );
        }
    } else if result.files_fixed > 0 {
        println!();
        println!(
            "{}",
            ctx.colors
                .paint(ctx.colors.success, format!("{} files fixed", result.files_fixed))
        );
    }

    if ctx.verbose && result.files_without_config > 0 {
        println!(
            "{}",
            ctx.colors.paint(
                ctx.colors.warning,
                format!(
                    "{} files without editorconfig settings",
                    result.files_without_config
                )
            )
        );
    }
}
