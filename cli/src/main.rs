//! CLI entrypoint for llm-council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::{CommandFactory, Parser};
use council_application::{
    BehaviorConfig, GenerateTitleUseCase, HealthMonitor, HealthStore, RunCouncilUseCase,
    progress_channel,
};
use council_domain::{ConfigIssue, OutputFormat, Question, Topology};
use council_infrastructure::{
    ConfigLoader, FileConfig, HttpWorkerGateway, JsonlConversationLogger, build_topology,
};
use council_presentation::{
    Cli, Command, ConsoleFormatter, CouncilEventSink, EventFormat, EventStreamWriter,
    OutputFormat as OutputArg, ProgressReporter, SilentProgress, SimpleProgress, StreamEnd,
    drain_events,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(
        cli.verbose,
        cli.log_dir.as_deref().or(config.logging.dir.as_deref()),
    )?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    check_config(&config)?;
    if !config.output.color {
        colored::control::set_override(false);
    }

    // === Dependency Injection ===
    let topology = Arc::new(build_topology(&config)?);
    let behavior = config.to_behavior_config();
    let gateway = Arc::new(HttpWorkerGateway::new());

    info!(
        "Starting llm-council with {} reviewers",
        topology.reviewer_count()
    );

    match command {
        Command::Ask {
            question,
            output,
            events,
        } => {
            let mut use_case =
                RunCouncilUseCase::new(gateway, topology.clone()).with_config(behavior.clone());
            if let Some(path) = &config.logging.conversation_log
                && let Some(logger) = JsonlConversationLogger::new(path)
            {
                debug!("Council transcript: {}", logger.path().display());
                use_case = use_case.with_conversation_logger(Arc::new(logger));
            }

            let question = Question::new(question)?;
            match events {
                Some(format) => stream_council(&use_case, question, format, &behavior).await,
                None => {
                    let format = output
                        .map(OutputFormat::from)
                        .or(config.output.format)
                        .unwrap_or_default();
                    let sink: Box<dyn CouncilEventSink> = if cli.quiet {
                        Box::new(SilentProgress)
                    } else if config.output.show_progress {
                        Box::new(ProgressReporter::new(topology.reviewer_count()))
                    } else {
                        Box::new(SimpleProgress::new())
                    };
                    ask_council(&use_case, question, format, sink.as_ref(), &behavior).await
                }
            }
        }
        Command::Title { question } => {
            let use_case = GenerateTitleUseCase::new(gateway, topology, behavior.title_timeout);
            println!("{}", use_case.execute(&question).await);
            Ok(())
        }
        Command::Health { watch, output } => {
            let json = output == Some(OutputArg::Json);
            show_health(gateway, topology, &behavior, watch, json).await
        }
        Command::Workers => {
            print!("{}", ConsoleFormatter::format_workers(&topology));
            Ok(())
        }
    }
}

/// Stderr logging filtered by `-v` (or `RUST_LOG`), plus an optional daily
/// rolling file.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "llm-council.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Log every config issue; abort on errors.
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in &issues {
        if issue.is_error() {
            error!("{}", issue);
        } else {
            warn!("{}", issue);
        }
    }
    let errors: Vec<String> = issues
        .iter()
        .filter(|i| i.is_error())
        .map(ConfigIssue::to_string)
        .collect();
    if !errors.is_empty() {
        bail!("Invalid configuration:\n  {}", errors.join("\n  "));
    }
    Ok(())
}

/// Run the council with a progress display and print the composed result.
async fn ask_council(
    use_case: &RunCouncilUseCase<HttpWorkerGateway>,
    question: Question,
    format: OutputFormat,
    sink: &dyn CouncilEventSink,
    behavior: &BehaviorConfig,
) -> Result<()> {
    let (emitter, receiver) = progress_channel(behavior.channel_capacity);
    // The run owns the emitter so the channel closes when it returns
    let run = async move { use_case.execute_with_progress(question, &emitter).await };
    let (result, ()) = tokio::join!(run, drain_events(receiver, sink));
    let result = result?;

    let output = match format {
        OutputFormat::Full => ConsoleFormatter::format(&result),
        OutputFormat::Synthesis => ConsoleFormatter::format_synthesis_only(&result),
        OutputFormat::Json => ConsoleFormatter::format_json(&result),
    };
    println!("{}", output);
    Ok(())
}

/// Run the council, streaming every event to stdout.
///
/// Closing stdout early is a disconnect, not a failure.
async fn stream_council(
    use_case: &RunCouncilUseCase<HttpWorkerGateway>,
    question: Question,
    format: EventFormat,
    behavior: &BehaviorConfig,
) -> Result<()> {
    let (emitter, receiver) = progress_channel(behavior.channel_capacity);
    let writer = EventStreamWriter::new(tokio::io::stdout(), format.into());
    let run = async move { use_case.execute_with_progress(question, &emitter).await };
    let (result, end) = tokio::join!(run, writer.drain(receiver));

    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_disconnect() => {
            if let StreamEnd::Disconnected { events } = end {
                debug!("Event consumer left after {} events", events);
            }
            Ok(())
        }
        // The error event has been streamed already
        Err(e) => Err(e.into()),
    }
}

async fn show_health(
    gateway: Arc<HttpWorkerGateway>,
    topology: Arc<Topology>,
    behavior: &BehaviorConfig,
    watch: bool,
    json: bool,
) -> Result<()> {
    let store = HealthStore::new();
    let monitor = HealthMonitor::new(gateway, topology.clone(), store.clone(), behavior);
    let print = |store: &HealthStore| {
        let view = store.view(&topology, chrono::Utc::now(), behavior.offline_threshold());
        if json {
            println!("{}", ConsoleFormatter::format_health_json(&view));
        } else {
            println!("{}", ConsoleFormatter::format_health(&view));
        }
    };

    monitor.poll_once().await;
    print(&store);
    if !watch {
        return Ok(());
    }
    if behavior.health_poll_interval.is_zero() {
        bail!("health.poll_interval_secs is 0; --watch needs a poll interval");
    }

    let cancel = CancellationToken::new();
    let handle = monitor.spawn(cancel.clone());
    let mut ticker = tokio::time::interval(behavior.health_poll_interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => print(&store),
        }
    }
    cancel.cancel();
    handle.await?;
    Ok(())
}
