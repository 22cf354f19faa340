//! Peer review records and parse outcomes.

use super::label::Label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scores tolerate formatting like `15.0` for `15`.
const TOTAL_EPSILON: f64 = 1e-6;

/// Largest accepted value for accuracy and insight
pub const MAX_SCORE: f64 = 10.0;

/// One parsed scores line (Value Object)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewScore {
    pub accuracy: f64,
    pub insight: f64,
    /// Total as written by the reviewer
    pub total: f64,
    /// Whether `total == accuracy + insight`. Recorded, never enforced.
    pub total_consistent: bool,
}

impl ReviewScore {
    pub fn new(accuracy: f64, insight: f64, total: f64) -> Self {
        Self {
            accuracy,
            insight,
            total,
            total_consistent: (accuracy + insight - total).abs() < TOTAL_EPSILON,
        }
    }

    /// `accuracy + insight`, the ranking criterion regardless of what the
    /// reviewer wrote as total.
    pub fn canonical_total(&self) -> f64 {
        self.accuracy + self.insight
    }
}

/// Something the parser noticed but tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseIssue {
    MissingScoresSection,
    MissingRankingSection,
    /// A line under the scores header that is not a score row
    MalformedScoreLine { line: String },
    ScoreOutOfRange { label: Label },
    InconsistentTotal { label: Label },
    /// A label that was not shown to this reviewer
    UnexpectedLabel { label: Label },
    DuplicateLabel { label: Label },
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseIssue::MissingScoresSection => write!(f, "no SCORES section"),
            ParseIssue::MissingRankingSection => write!(f, "no FINAL RANKING section"),
            ParseIssue::MalformedScoreLine { line } => write!(f, "malformed score line: {}", line),
            ParseIssue::ScoreOutOfRange { label } => write!(f, "{} has a score outside 0-10", label),
            ParseIssue::InconsistentTotal { label } => {
                write!(f, "{} total differs from accuracy + insight", label)
            }
            ParseIssue::UnexpectedLabel { label } => write!(f, "{} was not under review", label),
            ParseIssue::DuplicateLabel { label } => write!(f, "{} listed more than once", label),
        }
    }
}

/// Data recovered from a review text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedContent {
    /// Labels best-to-worst, only labels the reviewer was shown, no repeats
    pub ranking: Vec<Label>,
    pub scores: BTreeMap<Label, ReviewScore>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ParseIssue>,
}

/// Outcome of parsing one review text.
///
/// Raw text is kept on the [`ReviewRecord`], never in here, so no variant
/// can lose it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParsedReview {
    /// Both headers found and readable
    Strict(ParsedContent),
    /// Partial structure or bare label mentions
    Fallback(ParsedContent),
    /// Nothing usable. Contributes zero votes.
    Failed { issues: Vec<ParseIssue> },
}

impl ParsedReview {
    pub fn content(&self) -> Option<&ParsedContent> {
        match self {
            ParsedReview::Strict(c) | ParsedReview::Fallback(c) => Some(c),
            ParsedReview::Failed { .. } => None,
        }
    }

    pub fn ranking(&self) -> &[Label] {
        self.content().map(|c| c.ranking.as_slice()).unwrap_or(&[])
    }

    pub fn scores(&self) -> Option<&BTreeMap<Label, ReviewScore>> {
        self.content().map(|c| &c.scores)
    }

    pub fn issues(&self) -> &[ParseIssue] {
        match self {
            ParsedReview::Strict(c) | ParsedReview::Fallback(c) => &c.issues,
            ParsedReview::Failed { issues } => issues,
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, ParsedReview::Strict(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ParsedReview::Failed { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            ParsedReview::Strict(_) => "strict",
            ParsedReview::Fallback(_) => "fallback",
            ParsedReview::Failed { .. } => "failed",
        }
    }
}

/// One reviewer's round-2 output (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub reviewer: String,
    pub raw_text: String,
    /// Always every label except `excluded_label`
    pub reviewed_labels: Vec<Label>,
    pub excluded_label: Label,
    pub latency_ms: u64,
    pub parsed: ParsedReview,
}

impl ReviewRecord {
    pub fn ranking(&self) -> &[Label] {
        self.parsed.ranking()
    }

    pub fn score_for(&self, label: Label) -> Option<&ReviewScore> {
        self.parsed.scores().and_then(|s| s.get(&label))
    }
}
