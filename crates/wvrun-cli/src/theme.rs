//! Terminal capability detection and the console style palette.
//!
//! Styling state is one explicit object resolved once at startup from
//! environment hints, then passed by reference to the emitter. When the
//! output is not an interactive terminal (or `TERM` says the terminal is
//! unusable) every escape field is the empty string, so rendering code
//! never branches on capability.

use std::io::IsTerminal;

/// Fallback terminal width when no hint is available.
pub const DEFAULT_WIDTH: usize = 80;

/// Color policy from the `--color` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    #[must_use]
    pub fn from_slug(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "always" | "on" => Some(Self::Always),
            "never" | "off" => Some(Self::Never),
            _ => None,
        }
    }
}

/// Resolved environment hints used to derive the [`Style`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TermHints {
    pub term: Option<String>,
    pub no_color_env: bool,
    pub stdout_is_tty: bool,
    pub columns: Option<usize>,
}

impl TermHints {
    #[must_use]
    pub fn detect() -> Self {
        Self {
            term: std::env::var("TERM").ok(),
            no_color_env: std::env::var_os("NO_COLOR").is_some(),
            stdout_is_tty: std::io::stdout().is_terminal(),
            columns: std::env::var("COLUMNS")
                .ok()
                .and_then(|value| value.trim().parse::<usize>().ok()),
        }
    }

    /// A terminal whose `TERM` marks it unusable for escape sequences.
    #[must_use]
    fn term_unusable(&self) -> bool {
        matches!(self.term.as_deref(), Some("dumb") | Some(""))
    }
}

/// Escape palette plus layout hints for the console emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub bold: &'static str,
    pub pass: &'static str,
    pub fail: &'static str,
    pub reset: &'static str,
    pub width: usize,
    /// Whether the transient progress line may be drawn.
    pub progress: bool,
}

impl Style {
    /// No escapes, no progress: the rendering used for log files and
    /// non-interactive output.
    #[must_use]
    pub fn plain(width: usize) -> Self {
        Self {
            bold: "",
            pass: "",
            fail: "",
            reset: "",
            width,
            progress: false,
        }
    }
}

/// Resolve the style once at startup.
#[must_use]
pub fn resolve_style(mode: ColorMode, hints: &TermHints) -> Style {
    // `--color never` opts out of the interactive rendering entirely, not
    // just the escape sequences, so piped output stays clean.
    let interactive =
        hints.stdout_is_tty && !hints.term_unusable() && mode != ColorMode::Never;
    let colored = match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => interactive && !hints.no_color_env,
    };
    let width = hints.columns.unwrap_or(DEFAULT_WIDTH);
    if colored {
        Style {
            bold: "\x1b[1m",
            pass: "\x1b[32m",
            fail: "\x1b[31m",
            reset: "\x1b[0m",
            width,
            progress: interactive,
        }
    } else {
        Style {
            progress: interactive,
            ..Style::plain(width)
        }
    }
}
