//! Output format value objects

use serde::{Deserialize, Serialize};

/// How a finished council result is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every round, aggregates and notes on missing data
    Full,
    /// Only the final synthesis (default)
    #[default]
    Synthesis,
    /// The composed result as JSON
    Json,
}

/// Framing used when council events are streamed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    /// `event: <type>\ndata: <json>\n\n`
    Sse,
    /// One JSON envelope per line
    Ndjson,
}
