//! Presentation layer for llm-council
//!
//! This crate contains CLI definitions, output formatters, the event stream
//! writer, and progress reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, EventFormat, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use output::event_stream::{EventStreamWriter, StreamEnd};
pub use output::formatter::OutputFormatter;
pub use progress::reporter::{
    CouncilEventSink, ProgressReporter, SilentProgress, SimpleProgress, drain_events,
};
