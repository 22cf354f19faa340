//! Review text parsing.
//!
//! Reviewers are asked for a `SCORES:` section followed by a
//! `FINAL RANKING:` section, but nothing guarantees they comply. Parsing is
//! best effort and never fails hard: whatever cannot be read is reported as
//! a [`ParseIssue`] and the raw text stays on the review record.

use super::label::Label;
use super::review::{MAX_SCORE, ParseIssue, ParsedContent, ParsedReview, ReviewScore};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

pub const SCORES_HEADER: &str = "SCORES:";
pub const RANKING_HEADER: &str = "FINAL RANKING:";

static SCORES_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[\s#*_]*scores\s*:").expect("SCORES_HEADER_RE regex should compile"));

static RANKING_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)final\s+ranking\s*:").expect("RANKING_HEADER_RE regex should compile"));

static SCORE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"Response\s+([A-Z]{1,3})\b[\s*]*\|\s*(?i:accuracy)\s*[=:]\s*(-?\d+(?:\.\d+)?)",
        r"\s*\|\s*(?i:insight)\s*[=:]\s*(-?\d+(?:\.\d+)?)",
        r"\s*\|\s*(?i:total)\s*[=:]\s*(-?\d+(?:\.\d+)?)",
    ))
    .expect("SCORE_LINE_RE regex should compile")
});

static NUMBERED_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\d+\s*[.):\-]\s*[*_]*\s*Response\s+([A-Z]{1,3})\b")
        .expect("NUMBERED_LABEL_RE regex should compile")
});

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bResponse\s+([A-Z]{1,3})\b").expect("LABEL_RE regex should compile"));

/// Parse one review.
///
/// `reviewed` is the set of labels this reviewer was shown. Labels outside
/// it (its own label, hallucinated ones) are dropped, as are repeats.
///
/// - [`ParsedReview::Strict`]: the ranking came from a `FINAL RANKING:`
///   section.
/// - [`ParsedReview::Fallback`]: no usable ranking section. The ranking is
///   the order in which labels are first mentioned; scores never reorder it.
/// - [`ParsedReview::Failed`]: no ranking and no scores.
pub fn parse_review(text: &str, reviewed: &[Label]) -> ParsedReview {
    if reviewed.is_empty() {
        return ParsedReview::Strict(ParsedContent::default());
    }

    let reviewed: HashSet<Label> = reviewed.iter().copied().collect();
    let mut issues = Vec::new();

    let ranking_header = RANKING_HEADER_RE.find_iter(text).last();
    let scores_header = SCORES_HEADER_RE.find_iter(text).last();

    let scores = match scores_header {
        Some(header) => {
            let end = ranking_header
                .map(|r| r.start())
                .filter(|&start| start > header.end())
                .unwrap_or(text.len());
            parse_scores(&text[header.end()..end], &reviewed, true, &mut issues)
        }
        None => {
            issues.push(ParseIssue::MissingScoresSection);
            // Well-formed rows without their header still count
            parse_scores(text, &reviewed, false, &mut issues)
        }
    };

    let section = ranking_header.map(|header| &text[header.end()..]);
    if section.is_none() {
        issues.push(ParseIssue::MissingRankingSection);
    }

    if let Some(section) = section {
        let ranking = parse_ranking_section(section, &reviewed, &mut issues);
        if !ranking.is_empty() {
            return ParsedReview::Strict(ParsedContent {
                ranking,
                scores,
                issues,
            });
        }
    }

    let scan = section
        .filter(|s| LABEL_RE.is_match(s))
        .unwrap_or(text);
    let ranking = sanitize(label_tokens(&LABEL_RE, scan), &reviewed, None);

    if ranking.is_empty() && scores.is_empty() {
        return ParsedReview::Failed { issues };
    }

    ParsedReview::Fallback(ParsedContent {
        ranking,
        scores,
        issues,
    })
}

fn parse_scores(
    section: &str,
    reviewed: &HashSet<Label>,
    in_section: bool,
    issues: &mut Vec<ParseIssue>,
) -> BTreeMap<Label, ReviewScore> {
    let mut scores = BTreeMap::new();

    for line in section.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(caps) = SCORE_LINE_RE.captures(line) else {
            if in_section && LABEL_RE.is_match(line) {
                issues.push(ParseIssue::MalformedScoreLine {
                    line: line.to_string(),
                });
            }
            continue;
        };

        let Some(label) = Label::from_letters(&caps[1]) else {
            continue;
        };
        if !reviewed.contains(&label) {
            issues.push(ParseIssue::UnexpectedLabel { label });
            continue;
        }
        if scores.contains_key(&label) {
            issues.push(ParseIssue::DuplicateLabel { label });
            continue;
        }

        let number = |i: usize| caps[i].parse::<f64>().ok();
        let (Some(accuracy), Some(insight), Some(total)) = (number(2), number(3), number(4)) else {
            issues.push(ParseIssue::MalformedScoreLine {
                line: line.to_string(),
            });
            continue;
        };

        if !(0.0..=MAX_SCORE).contains(&accuracy) || !(0.0..=MAX_SCORE).contains(&insight) {
            issues.push(ParseIssue::ScoreOutOfRange { label });
            continue;
        }

        let score = ReviewScore::new(accuracy, insight, total);
        if !score.total_consistent {
            issues.push(ParseIssue::InconsistentTotal { label });
        }
        scores.insert(label, score);
    }

    scores
}

/// Numbered list first, else a bare list of labels.
fn parse_ranking_section(
    section: &str,
    reviewed: &HashSet<Label>,
    issues: &mut Vec<ParseIssue>,
) -> Vec<Label> {
    let numbered = label_tokens(&NUMBERED_LABEL_RE, section);
    let candidates = if numbered.is_empty() {
        label_tokens(&LABEL_RE, section)
    } else {
        numbered
    };
    sanitize(candidates, reviewed, Some(issues))
}

fn label_tokens(re: &Regex, text: &str) -> Vec<Label> {
    re.captures_iter(text)
        .filter_map(|caps| Label::from_letters(&caps[1]))
        .collect()
}

/// Keep reviewed labels only, first occurrence wins. Missing labels are not
/// appended.
///
/// Issues are reported only for explicit lists; free-text scans mention
/// labels repeatedly by nature.
fn sanitize(
    candidates: Vec<Label>,
    reviewed: &HashSet<Label>,
    mut issues: Option<&mut Vec<ParseIssue>>,
) -> Vec<Label> {
    let mut seen = HashSet::new();
    let mut ranking = Vec::new();

    for label in candidates {
        if !reviewed.contains(&label) {
            if let Some(issues) = issues.as_deref_mut() {
                issues.push(ParseIssue::UnexpectedLabel { label });
            }
        } else if !seen.insert(label) {
            if let Some(issues) = issues.as_deref_mut() {
                issues.push(ParseIssue::DuplicateLabel { label });
            }
        } else {
            ranking.push(label);
        }
    }

    ranking
}
