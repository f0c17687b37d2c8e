//! Output formatter trait

use crate::cli::commands::OutputFormat;
use council_domain::DeliberationResult;

/// Trait for formatting deliberation results
pub trait OutputFormatter {
    /// Every iteration, review and the final artifact
    fn format(&self, result: &DeliberationResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &DeliberationResult) -> String;

    /// Final artifact only (concise output)
    fn format_final(&self, result: &DeliberationResult) -> String;

    /// Render `result` in the selected output format
    fn render(&self, result: &DeliberationResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format(result),
            OutputFormat::Final => self.format_final(result),
            OutputFormat::Json => self.format_json(result),
        }
    }
}
