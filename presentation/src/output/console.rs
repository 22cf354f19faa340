//! Console output formatter for council results and health views

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_domain::{CouncilHealth, CouncilResult, ParsedReview, Topology, WorkerHealth};

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete council result
    pub fn format(result: &CouncilResult) -> String {
        let mut output = String::new();

        // Header
        output.push_str(&Self::header("LLM Council Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n\n",
            "Question:".cyan().bold(),
            result.question
        ));

        // Round 1: Responses
        output.push_str(&Self::section_header("Round 1: Responses"));
        for response in &result.round1 {
            let model = response
                .model
                .as_deref()
                .map(|m| format!(", {}", m))
                .unwrap_or_default();
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} ({} ms{}) ──", response.worker, response.latency_ms, model)
                    .yellow()
                    .bold(),
                response.text
            ));
        }
        for failure in &result.round1_failures {
            output.push_str(&format!(
                "\n{}\nError: {}\n",
                format!("── {} ──", failure.worker).red().bold(),
                failure.reason
            ));
        }

        // Round 2: Peer Review
        if !result.round2.is_empty() || !result.round2_failures.is_empty() {
            output.push_str(&Self::section_header("Round 2: Peer Review"));

            output.push_str(&format!("\n{}\n", "Labels:".cyan().bold()));
            for (label, identity) in result.metadata.label_mapping.iter() {
                output.push_str(&format!("  {} = {}\n", label, identity));
            }

            for review in &result.round2 {
                let reviewed: Vec<String> =
                    review.reviewed_labels.iter().map(ToString::to_string).collect();
                let status = match &review.parsed {
                    ParsedReview::Strict(_) => "parsed".green(),
                    ParsedReview::Fallback(_) => "fallback".yellow(),
                    ParsedReview::Failed { .. } => "unparsed".red(),
                };
                output.push_str(&format!(
                    "\n{} [{}]\n{}\n",
                    format!("── {} reviewed {} ──", review.reviewer, reviewed.join(", "))
                        .yellow()
                        .bold(),
                    status,
                    Self::indent(&review.raw_text, "  ")
                ));
            }
            for failure in &result.round2_failures {
                output.push_str(&format!(
                    "\n{}\nError: {}\n",
                    format!("── {} ──", failure.worker).red().bold(),
                    failure.reason
                ));
            }

            output.push_str(&Self::aggregates(result));
        }

        // Round 3: Synthesis
        output.push_str(&Self::section_header("Round 3: Synthesis"));
        output.push_str(&format!(
            "\n{}\n\n{}\n",
            format!("Synthesizer: {}", result.round3.worker)
                .yellow()
                .bold(),
            result.round3.text
        ));

        output.push_str(&Self::notes_block(result));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(result: &CouncilResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format synthesis only (concise output)
    pub fn format_synthesis_only(result: &CouncilResult) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== LLM Council Conclusion ===".cyan().bold()
        ));

        output.push_str(&format!("{} {}\n\n", "Q:".bold(), result.question));

        let consulted: Vec<&str> = result.round1.iter().map(|r| r.worker.as_str()).collect();
        output.push_str(&format!(
            "{} {}\n\n",
            "Workers consulted:".dimmed(),
            consulted.join(", ")
        ));

        output.push_str(&result.round3.text);
        output.push('\n');
        output.push_str(&Self::notes_block(result));

        output
    }

    /// Explicit notes on everything missing, unparsed or tied.
    ///
    /// Empty when every worker answered, every review parsed strictly and
    /// no identities share a rank.
    pub fn notes(result: &CouncilResult) -> Vec<String> {
        let mut notes = Vec::new();

        for failure in &result.round1_failures {
            notes.push(format!(
                "No response from {}: {}",
                failure.worker, failure.reason
            ));
        }
        if result.round1.len() == 1 {
            notes.push("Peer review was trivial: only one worker answered".to_string());
        }
        for failure in &result.round2_failures {
            notes.push(format!("No review from {}: {}", failure.worker, failure.reason));
        }
        for review in &result.round2 {
            match &review.parsed {
                ParsedReview::Failed { .. } => notes.push(format!(
                    "Review by {} could not be parsed; it casts no votes (raw text kept)",
                    review.reviewer
                )),
                ParsedReview::Fallback(content) if content.scores.is_empty() => {
                    notes.push(format!(
                        "Review by {} has no scores; ranking inferred from label mentions",
                        review.reviewer
                    ))
                }
                ParsedReview::Fallback(_) => notes.push(format!(
                    "Review by {} has no FINAL RANKING; ranking derived from its scores",
                    review.reviewer
                )),
                ParsedReview::Strict(_) => {}
            }
        }
        for tie in &result.metadata.rank_ties {
            let mut note = format!(
                "Tie: {} share average rank {:.2}",
                tie.identities.join(" and "),
                tie.average_rank
            );
            if !tie.by_aggregate_score.is_empty() {
                note.push_str(&format!(
                    " (by aggregate score: {})",
                    tie.by_aggregate_score.join(", ")
                ));
            }
            notes.push(note);
        }

        notes
    }

    fn notes_block(result: &CouncilResult) -> String {
        let notes = Self::notes(result);
        if notes.is_empty() {
            return String::new();
        }
        let mut output = format!("\n{}\n", "Notes:".yellow().bold());
        for note in notes {
            output.push_str(&format!("  * {}\n", note));
        }
        output
    }

    fn aggregates(result: &CouncilResult) -> String {
        let metadata = &result.metadata;
        if metadata.aggregate_ranks.is_empty() && metadata.aggregate_scores.is_empty() {
            return format!("\n{}\n", "No parseable rankings or scores.".dimmed());
        }

        let mut output = String::new();
        if !metadata.aggregate_ranks.is_empty() {
            output.push_str(&format!("\n{}\n", "Aggregate Ranking:".cyan().bold()));
            for (i, rank) in metadata.aggregate_ranks.iter().enumerate() {
                let tied = if rank.tied { " (tie)" } else { "" };
                output.push_str(&format!(
                    "  {}. {} ({})  avg rank {:.2}  votes {}{}\n",
                    i + 1,
                    rank.identity,
                    rank.label,
                    rank.average_rank,
                    rank.vote_count,
                    tied
                ));
            }
        }
        if !metadata.aggregate_scores.is_empty() {
            output.push_str(&format!("\n{}\n", "Aggregate Scores:".cyan().bold()));
            for score in &metadata.aggregate_scores {
                output.push_str(&format!(
                    "  {} ({})  accuracy {:.1}  insight {:.1}  total {:.1}  votes {}\n",
                    score.identity,
                    score.label,
                    score.average_accuracy,
                    score.average_insight,
                    score.average_total,
                    score.vote_count
                ));
            }
        }
        output
    }

    /// Health view as a table
    pub fn format_health(health: &CouncilHealth) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {}  ({}/{} online)\n\n",
            "Worker health at".cyan().bold(),
            health.checked_at.format("%Y-%m-%d %H:%M:%S UTC"),
            health.online_count(),
            health.reviewers.len() + 1
        ));
        output.push_str(&format!(
            "{:<16} {:<12} {:<13} {:<10} {:<20} {}\n",
            "NAME", "ROLE", "STATUS", "SEEN", "MODEL", "LOAD"
        ));
        for worker in health.all() {
            output.push_str(&Self::health_row(worker, health));
            output.push('\n');
        }
        output
    }

    fn health_row(worker: &WorkerHealth, health: &CouncilHealth) -> String {
        let record = &worker.record;
        let status = if worker.offline {
            format!("{:<13}", "offline").red().to_string()
        } else {
            let padded = format!("{:<13}", worker.status.as_str());
            match worker.status {
                council_domain::WorkerStatus::BackendOk => padded.green().to_string(),
                council_domain::WorkerStatus::BackendDown => padded.yellow().to_string(),
                council_domain::WorkerStatus::Unreachable => padded.red().to_string(),
                council_domain::WorkerStatus::Unknown => padded.dimmed().to_string(),
            }
        };
        let seen = match record.last_seen {
            Some(at) => format!("{}s ago", (health.checked_at - at).num_seconds().max(0)),
            None => "never".to_string(),
        };
        let load = match (record.busy, record.active_requests) {
            (Some(true), Some(n)) => format!("busy ({} active)", n),
            (Some(true), None) => "busy".to_string(),
            (_, Some(n)) => format!("{} active", n),
            _ => "-".to_string(),
        };
        let mut row = format!(
            "{:<16} {:<12} {} {:<10} {:<20} {}",
            worker.name,
            worker.role.as_str(),
            status,
            seen,
            record.backend_model.as_deref().unwrap_or("-"),
            load
        );
        if let Some(error) = &record.last_error {
            row.push_str(&format!("\n{:<16} {}", "", error.dimmed()));
        }
        row
    }

    /// Health view as JSON
    pub fn format_health_json(health: &CouncilHealth) -> String {
        serde_json::to_string_pretty(health).unwrap_or_else(|_| "{}".to_string())
    }

    /// Configured workers, registration order
    pub fn format_workers(topology: &Topology) -> String {
        let mut output = format!("{}\n", "Workers:".cyan().bold());
        let title = topology.title_worker().map(|w| w.name.as_str());
        for worker in topology.workers() {
            let marker = if Some(worker.name.as_str()) == title {
                " (title)"
            } else {
                ""
            };
            output.push_str(&format!(
                "  {:<16} {:<12} {}{}\n",
                worker.name,
                worker.role.as_str(),
                worker.address,
                marker
            ));
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, result: &CouncilResult) -> String {
        Self::format(result)
    }

    fn format_json(&self, result: &CouncilResult) -> String {
        Self::format_json(result)
    }

    fn format_synthesis_only(&self, result: &CouncilResult) -> String {
        Self::format_synthesis_only(result)
    }
}
