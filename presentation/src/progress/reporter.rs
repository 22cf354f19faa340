//! Progress reporting for council runs
//!
//! Both reporters consume the same [`CouncilEvent`]s that `--events`
//! streams to stdout. They draw on stderr so stdout stays the result.

use colored::Colorize;
use council_application::CouncilEvent;
use council_domain::Round;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Consumer side of a council's progress channel
pub trait CouncilEventSink: Send + Sync {
    fn on_event(&self, event: &CouncilEvent);
}

/// Feed every event to `sink` until the producer finishes.
pub async fn drain_events(mut receiver: mpsc::Receiver<CouncilEvent>, sink: &dyn CouncilEventSink) {
    while let Some(event) = receiver.recv().await {
        sink.on_event(&event);
    }
}

/// Discards events (`--quiet`)
pub struct SilentProgress;

impl CouncilEventSink for SilentProgress {
    fn on_event(&self, _event: &CouncilEvent) {}
}

struct RoundBar {
    round: Round,
    bar: ProgressBar,
}

/// Reports progress during a council run with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    reviewers: usize,
    current: Mutex<Option<RoundBar>>,
    /// Round-1 answers seen, i.e. how many reviews round 2 expects
    answered: Mutex<usize>,
}

impl ProgressReporter {
    pub fn new(reviewers: usize) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            reviewers,
            current: Mutex::new(None),
            answered: Mutex::new(0),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn round_short_name(round: Round) -> &'static str {
        match round {
            Round::Responses => "Round 1",
            Round::Review => "Round 2",
            Round::Synthesis => "Round 3",
        }
    }

    fn expected(&self, round: Round) -> usize {
        match round {
            Round::Responses => self.reviewers,
            Round::Review => *lock(&self.answered),
            Round::Synthesis => 1,
        }
    }

    /// Make sure the bar for `round` is the current one, finishing the
    /// previous round's bar.
    fn enter(&self, round: Round) {
        let mut current = lock(&self.current);
        if matches!(current.as_ref(), Some(c) if c.round == round) {
            return;
        }
        if let Some(previous) = current.take() {
            Self::finish(previous);
        }

        let bar = self.multi.add(ProgressBar::new(self.expected(round) as u64));
        bar.set_style(Self::round_style());
        bar.set_prefix(round.display_name().to_string());
        bar.set_message("Waiting...");
        *current = Some(RoundBar { round, bar });
    }

    fn advance(&self, message: String) {
        if let Some(current) = lock(&self.current).as_ref() {
            current.bar.set_message(message);
            current.bar.inc(1);
        }
    }

    fn finish(round_bar: RoundBar) {
        let name = Self::round_short_name(round_bar.round);
        let done = round_bar.bar.position();
        let expected = round_bar.bar.length().unwrap_or(done);
        if done < expected {
            round_bar.bar.finish_with_message(format!(
                "{} complete ({} missing)",
                name.yellow(),
                expected - done
            ));
        } else {
            round_bar
                .bar
                .finish_with_message(format!("{} complete!", name.green()));
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CouncilEventSink for ProgressReporter {
    fn on_event(&self, event: &CouncilEvent) {
        match event {
            CouncilEvent::Round1Response(response) => {
                self.enter(Round::Responses);
                *lock(&self.answered) += 1;
                self.advance(format!(
                    "{} {} ({} ms)",
                    "v".green(),
                    response.worker,
                    response.latency_ms
                ));
            }
            CouncilEvent::Round2Review(review) => {
                self.enter(Round::Review);
                let mark = if review.parsed.is_failed() {
                    "?".yellow()
                } else {
                    "v".green()
                };
                self.advance(format!("{} {}", mark, review.reviewer));
            }
            CouncilEvent::Round3Response(response) => {
                self.enter(Round::Synthesis);
                self.advance(format!("{} {}", "v".green(), response.worker));
            }
            CouncilEvent::Error(error) => {
                if let Some(current) = lock(&self.current).take() {
                    current
                        .bar
                        .abandon_with_message(format!("{} {}", "x".red(), error.message));
                }
            }
            CouncilEvent::Done(_) => {
                if let Some(current) = lock(&self.current).take() {
                    Self::finish(current);
                }
            }
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress {
    last_round: Mutex<Option<Round>>,
}

impl SimpleProgress {
    pub fn new() -> Self {
        Self {
            last_round: Mutex::new(None),
        }
    }

    fn announce(&self, round: Round) {
        let mut last = lock(&self.last_round);
        if *last != Some(round) {
            eprintln!("{} {}", "->".cyan(), round.display_name().bold());
            *last = Some(round);
        }
    }
}

impl Default for SimpleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CouncilEventSink for SimpleProgress {
    fn on_event(&self, event: &CouncilEvent) {
        match event {
            CouncilEvent::Round1Response(response) => {
                self.announce(Round::Responses);
                eprintln!("  {} {}", "v".green(), response.worker);
            }
            CouncilEvent::Round2Review(review) => {
                self.announce(Round::Review);
                if review.parsed.is_failed() {
                    eprintln!("  {} {} (unparsed)", "?".yellow(), review.reviewer);
                } else {
                    eprintln!("  {} {}", "v".green(), review.reviewer);
                }
            }
            CouncilEvent::Round3Response(response) => {
                self.announce(Round::Synthesis);
                eprintln!("  {} {}", "v".green(), response.worker);
            }
            CouncilEvent::Error(error) => {
                eprintln!("  {} {}", "x".red(), error.message);
            }
            CouncilEvent::Done(_) => eprintln!(),
        }
    }
}
