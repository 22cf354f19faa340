//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every round, aggregates and notes on missing data
    Full,
    /// Only the final synthesis
    Synthesis,
    /// JSON output
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => council_domain::OutputFormat::Full,
            OutputFormat::Synthesis => council_domain::OutputFormat::Synthesis,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// Framing for `--events`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventFormat {
    /// Server-sent events: `event: <type>` + `data: <json>`
    Sse,
    /// One JSON envelope per line
    Ndjson,
}

impl From<EventFormat> for council_domain::EventFormat {
    fn from(format: EventFormat) -> Self {
        match format {
            EventFormat::Sse => council_domain::EventFormat::Sse,
            EventFormat::Ndjson => council_domain::EventFormat::Ndjson,
        }
    }
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(author, version, about = "LLM Council - distributed workers answer, review each other and synthesize")]
#[command(long_about = r#"
llm-council runs a council of remote LLM workers over HTTP.

A query goes through three rounds:
1. Responses:   every reviewer worker answers in parallel
2. Peer Review: each reviewer scores and ranks the others' answers, anonymized
3. Synthesis:   the synthesizer worker writes the final answer

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables
2. --config <path>                      Explicit config file
3. ./council.toml                       Project-level config
4. ~/.config/llm-council/config.toml    Global config

Example:
  llm-council ask "What's the best way to handle errors in Rust?"
  llm-council ask -o full "Compare async runtimes"
  llm-council ask --events sse "Explain ownership" | tee events.log
  llm-council health --watch
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Directory for daily rolling log files
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask the council a question
    Ask {
        /// The question to ask the council
        question: String,

        /// Output format (defaults to [output] format, else synthesis)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,

        /// Stream council events to stdout instead of printing a result
        #[arg(long, value_enum, value_name = "FORMAT")]
        events: Option<EventFormat>,
    },

    /// Generate a short conversation title for a question
    Title {
        question: String,
    },

    /// Probe every worker and print the health view
    Health {
        /// Keep polling until Ctrl-C
        #[arg(short, long)]
        watch: bool,

        /// Output format (only `json` changes anything)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// List the configured workers
    Workers,
}
