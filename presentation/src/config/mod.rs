//! Presentation-level configuration
//!
//! Resolved output settings: command-line flags win over the config file.

use crate::cli::commands::OutputFormat;
use serde::{Deserialize, Serialize};

/// Output configuration for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format from the config file, if any
    pub format: Option<OutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
    /// Show progress indicators
    pub show_progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
            show_progress: true,
        }
    }
}

impl OutputConfig {
    /// Format to use given the `--output` flag
    pub fn resolve_format(&self, cli: Option<OutputFormat>) -> OutputFormat {
        cli.or(self.format).unwrap_or_default()
    }

    /// Whether progress bars should be drawn given `--quiet` and the format
    pub fn progress_enabled(&self, quiet: bool, format: OutputFormat) -> bool {
        self.show_progress && !quiet && format != OutputFormat::Json
    }
}
