//! Centralized shell output.
//!
//! The Shell provides a unified API for CLI output:
//! - Status messages with consistent right-aligned formatting
//! - JSON output mode for machine-readable reports
//!
//! Human and JSON modes are mutually exclusive: in JSON mode status lines
//! are suppressed and only JSON events reach stdout.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};

/// Shell output mode - Human and Json are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    /// Human-readable output with optional colors.
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    /// Machine-readable JSON output only.
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (Human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only
    Quiet,
    #[default]
    Normal,
    /// --verbose: per-file status lines
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
///
/// Shell handles all formatting - callers just specify the semantic status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Configured,
    Finished,
    Restored,

    // In-progress statuses (cyan)
    Discovering,
    Filtering,

    // Info statuses (blue)
    Info,
    Kept,
    Disabled,

    // Warning statuses (yellow)
    Skipped,
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    /// Get the display text for this status.
    fn as_str(&self) -> &'static str {
        match self {
            Status::Configured => "Configured",
            Status::Finished => "Finished",
            Status::Restored => "Restored",
            Status::Discovering => "Discovering",
            Status::Filtering => "Filtering",
            Status::Info => "Info",
            Status::Kept => "Kept",
            Status::Disabled => "Disabled",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    /// Get the ANSI color code for this status.
    fn color_code(&self) -> &'static str {
        match self {
            Status::Configured | Status::Finished | Status::Restored => "\x1b[1;32m",
            Status::Discovering | Status::Filtering => "\x1b[1;36m",
            Status::Info | Status::Kept | Status::Disabled => "\x1b[1;34m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }

    /// Per-file statuses are only shown in verbose mode.
    fn is_detail(&self) -> bool {
        matches!(self, Status::Kept | Status::Disabled | Status::Restored)
    }
}

/// Width of the right-aligned status column.
const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
}

impl Shell {
    /// Create a new shell with the given mode.
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell { mode, use_color }
    }

    /// Create a shell from CLI flags with proper precedence.
    ///
    /// JSON mode takes precedence over quiet/verbose.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, json: bool) -> Self {
        let mode = if json {
            ShellMode::Json
        } else {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human { verbosity, color }
        };

        Shell::new(mode)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`
    ///
    /// In quiet mode, only Error status is printed. Per-file statuses need
    /// verbose mode. In JSON mode, messages are ignored.
    pub fn status(&self, status: Status, msg: impl Display) {
        if let Some(line) = self.render_status(status, msg) {
            eprintln!("{}", line);
        }
    }

    /// Print an info message.
    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print an error message.
    ///
    /// In JSON mode, this outputs a JSON error event.
    pub fn error(&self, msg: impl Display) {
        if self.is_json() {
            let event = serde_json::json!({
                "reason": "error",
                "message": msg.to_string()
            });
            self.json_event(&event);
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// Print a plain line to stdout (listings meant for piping).
    ///
    /// Ignored in JSON mode.
    pub fn println(&self, msg: impl Display) {
        if self.is_json() {
            return;
        }
        println!("{}", msg);
    }

    /// Print a JSON event to stdout.
    ///
    /// Only works in JSON mode; silently ignored in human mode.
    pub fn json_event(&self, event: &serde_json::Value) {
        if !self.is_json() {
            return;
        }

        let json_str = serde_json::to_string(event).unwrap_or_default();
        println!("{}", json_str);
        let _ = io::stdout().flush();
    }

    /// Build the line `status` would print, or `None` if it is suppressed.
    fn render_status(&self, status: Status, msg: impl Display) -> Option<String> {
        if self.is_json() {
            return None;
        }
        if self.is_quiet() && status != Status::Error {
            return None;
        }
        if status.is_detail() && !self.is_verbose() {
            return None;
        }

        Some(format!("{} {}", self.format_status(status), msg))
    }

    /// Format a status prefix with optional color.
    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();

        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(verbosity: Verbosity) -> Shell {
        Shell::new(ShellMode::Human {
            verbosity,
            color: ColorChoice::Never,
        })
    }

    #[test]
    fn test_status_alignment() {
        let shell = plain(Verbosity::Normal);
        let line = shell.render_status(Status::Filtering, "drivers").unwrap();
        assert_eq!(line, "   Filtering drivers");
    }

    #[test]
    fn test_detail_needs_verbose() {
        assert!(plain(Verbosity::Normal)
            .render_status(Status::Disabled, "driver_a.cc")
            .is_none());
        assert!(plain(Verbosity::Verbose)
            .render_status(Status::Disabled, "driver_a.cc")
            .is_some());
    }

    #[test]
    fn test_quiet_and_json_suppress_status() {
        assert!(plain(Verbosity::Quiet)
            .render_status(Status::Finished, "x")
            .is_none());
        assert!(plain(Verbosity::Quiet)
            .render_status(Status::Error, "x")
            .is_some());
        assert!(Shell::new(ShellMode::Json)
            .render_status(Status::Error, "x")
            .is_none());
    }

    #[test]
    fn test_json_takes_precedence() {
        let shell = Shell::from_flags(true, true, ColorChoice::Always, true);
        assert!(shell.is_json());
        assert!(!shell.use_color());
    }

    #[test]
    fn test_color_choice_parse() {
        assert_eq!("Never".parse::<ColorChoice>(), Ok(ColorChoice::Never));
        assert!("sometimes".parse::<ColorChoice>().is_err());
    }
}
