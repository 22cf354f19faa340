//! Output formatter trait

use council_domain::CouncilResult;

/// Trait for formatting council results
pub trait OutputFormatter {
    /// Format the complete council result
    fn format(&self, result: &CouncilResult) -> String;

    /// Format as JSON
    fn format_json(&self, result: &CouncilResult) -> String;

    /// Format synthesis only (concise output)
    fn format_synthesis_only(&self, result: &CouncilResult) -> String;
}
