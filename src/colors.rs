use std::fmt::Display;
use std::io::{self, IsTerminal};

const RESET: &str = "\x1b[0m";

/// ANSI styles for terminal output. All styles are empty when disabled.
#[derive(Clone, Copy)]
pub struct Colors {
    pub error: &'static str,
    pub warning: &'static str,
    pub success: &'static str,
    pub info: &'static str,
    enabled: bool,
}

impl Colors {
    pub fn new(enabled: bool) -> Self {
        let style = |code: &'static str| if enabled { code } else { "" };
        Self {
            error: style("\x1b[31m"),
            warning: style("\x1b[33m"),
            success: style("\x1b[32m"),
            info: style("\x1b[36m"),
            enabled,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn reset(&self) -> &'static str {
        if self.enabled {
            RESET
        } else {
            ""
        }
    }

    /// Wrap `text` in `style` and a reset.
    pub fn paint(&self, style: &str, text: impl Display) -> String {
        format!("{style}{text}{}", self.reset())
    }
}

/// Priority: --no-color > --color > NO_COLOR env > TTY detection
pub fn should_use_colors(force_color: bool, no_color: bool) -> bool {
    if no_color {
        return false;
    }
    if force_color {
        return true;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stdout().is_terminal()
}
