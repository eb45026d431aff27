use std::path::Path;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Below this many files no bar is drawn.
const PROGRESS_THRESHOLD: u64 = 10;

const TEMPLATE: &str = "{spinner:.green} applying [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

/// Progress over the files of one run, drawn on stderr.
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(total: u64, enabled: bool) -> Self {
        if !enabled || total < PROGRESS_THRESHOLD {
            return Self::hidden();
        }

        let bar = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar: Some(bar) }
    }

    pub fn hidden() -> Self {
        Self { bar: None }
    }

    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }

    /// Show `path` as the file being worked on.
    pub fn start(&self, path: &Path) {
        if let Some(bar) = &self.bar {
            bar.set_message(path.display().to_string());
        }
    }

    pub fn finish_one(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
