//! Output formatting utilities
//!
//! Formatters for the human-readable and JSON output of the non-interactive
//! parts of s3pick, plus the spinner shown before the browser opens.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ProgressBar;

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable the spinner
    pub no_progress: bool,
    /// Suppress non-error output other than the selection
    pub quiet: bool,
}
