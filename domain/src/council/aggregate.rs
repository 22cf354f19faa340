//! Cross-reviewer aggregation.
//!
//! Only parseable data counts: a reviewer that produced no ranking for an
//! identity casts no rank vote for it, and identities with zero votes are
//! omitted rather than reported with empty averages.

use super::label::{Label, LabelMapping};
use super::review::ReviewRecord;
use serde::Serialize;
use std::collections::BTreeMap;

const RANK_EPSILON: f64 = 1e-9;

/// Average 1-based rank position of one identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRank {
    pub identity: String,
    pub label: Label,
    pub average_rank: f64,
    pub vote_count: usize,
    /// Shares its average rank with at least one other identity
    pub tied: bool,
}

/// Average scores of one identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateScore {
    pub identity: String,
    pub label: Label,
    pub average_accuracy: f64,
    pub average_insight: f64,
    /// Average of `accuracy + insight`, not of the totals reviewers wrote
    pub average_total: f64,
    pub vote_count: usize,
}

/// Identities that share an average rank.
///
/// The tie is reported as is. `by_aggregate_score` is a secondary
/// comparison: the tied identities ordered by average total, best first,
/// listing only those that received scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankTie {
    pub average_rank: f64,
    pub identities: Vec<String>,
    pub by_aggregate_score: Vec<String>,
}

/// Aggregated view over all round-2 reviews
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregates {
    /// Best (lowest average rank) first
    pub ranks: Vec<AggregateRank>,
    /// Best (highest average total) first
    pub scores: Vec<AggregateScore>,
    pub ties: Vec<RankTie>,
}

#[derive(Default)]
struct ScoreSums {
    accuracy: f64,
    insight: f64,
    total: f64,
    votes: usize,
}

impl Aggregates {
    pub fn compute(records: &[ReviewRecord], mapping: &LabelMapping) -> Self {
        let mut positions: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
        let mut sums: BTreeMap<Label, ScoreSums> = BTreeMap::new();

        for record in records {
            for (i, label) in record.ranking().iter().enumerate() {
                if mapping.contains(*label) && record.reviewed_labels.contains(label) {
                    positions.entry(*label).or_default().push(i + 1);
                }
            }
            if let Some(scores) = record.parsed.scores() {
                for (label, score) in scores {
                    if !mapping.contains(*label) || !record.reviewed_labels.contains(label) {
                        continue;
                    }
                    let entry = sums.entry(*label).or_default();
                    entry.accuracy += score.accuracy;
                    entry.insight += score.insight;
                    entry.total += score.canonical_total();
                    entry.votes += 1;
                }
            }
        }

        let mut scores: Vec<AggregateScore> = sums
            .into_iter()
            .filter_map(|(label, s)| {
                let identity = mapping.identity_of(label)?.to_string();
                let n = s.votes as f64;
                Some(AggregateScore {
                    identity,
                    label,
                    average_accuracy: s.accuracy / n,
                    average_insight: s.insight / n,
                    average_total: s.total / n,
                    vote_count: s.votes,
                })
            })
            .collect();
        scores.sort_by(|a, b| {
            b.average_total
                .total_cmp(&a.average_total)
                .then(b.average_accuracy.total_cmp(&a.average_accuracy))
                .then(b.average_insight.total_cmp(&a.average_insight))
                .then(a.label.cmp(&b.label))
        });

        let mut ranks: Vec<AggregateRank> = positions
            .into_iter()
            .filter_map(|(label, votes)| {
                let identity = mapping.identity_of(label)?.to_string();
                let sum: usize = votes.iter().sum();
                Some(AggregateRank {
                    identity,
                    label,
                    average_rank: sum as f64 / votes.len() as f64,
                    vote_count: votes.len(),
                    tied: false,
                })
            })
            .collect();
        ranks.sort_by(|a, b| {
            a.average_rank
                .total_cmp(&b.average_rank)
                .then(a.label.cmp(&b.label))
        });

        let ties = mark_ties(&mut ranks, &scores);

        Self {
            ranks,
            scores,
            ties,
        }
    }

    pub fn rank_for(&self, identity: &str) -> Option<&AggregateRank> {
        self.ranks.iter().find(|r| r.identity == identity)
    }

    pub fn score_for(&self, identity: &str) -> Option<&AggregateScore> {
        self.scores.iter().find(|s| s.identity == identity)
    }
}

/// Flag runs of equal average rank. `ranks` must already be sorted.
fn mark_ties(ranks: &mut [AggregateRank], scores: &[AggregateScore]) -> Vec<RankTie> {
    let mut ties = Vec::new();
    let mut start = 0;

    while start < ranks.len() {
        let mut end = start + 1;
        while end < ranks.len()
            && (ranks[end].average_rank - ranks[start].average_rank).abs() < RANK_EPSILON
        {
            end += 1;
        }

        if end - start > 1 {
            let group = &mut ranks[start..end];
            for rank in group.iter_mut() {
                rank.tied = true;
            }
            let identities: Vec<String> = group.iter().map(|r| r.identity.clone()).collect();
            // `scores` is sorted best first, so filtering keeps that order
            let by_aggregate_score = scores
                .iter()
                .filter(|s| identities.contains(&s.identity))
                .map(|s| s.identity.clone())
                .collect();
            ties.push(RankTie {
                average_rank: group[0].average_rank,
                identities,
                by_aggregate_score,
            });
        }
        start = end;
    }

    ties
}
