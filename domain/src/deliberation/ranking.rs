//! Aggregate ranking across reviewers
//!
//! Each reviewer's ranked list contributes `1 / position` to the model
//! behind each label. Models are ordered by total score, then by how many
//! reviewers ranked them at all; models nobody ranked share the bottom
//! bucket with a score of zero. The result is informational and does not
//! affect which submission moves on to test generation.

use super::entities::ReviewerReport;
use super::label::LabelMap;
use crate::core::model::ModelId;
use serde::{Deserialize, Serialize};

/// Aggregate standing of one model in a review round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRanking {
    pub model: ModelId,
    /// Sum of `1 / position` over every reviewer that ranked the model
    pub score: f64,
    /// Number of reviewers that ranked the model
    pub mentions: usize,
    /// Mean 1-based position among reviewers that ranked the model
    pub average_position: Option<f64>,
}

/// Aggregate the rankings of one review round, best first
pub fn aggregate_rankings(reports: &[ReviewerReport], labels: &LabelMap) -> Vec<AggregateRanking> {
    let mut rows: Vec<(usize, AggregateRanking, usize)> = labels
        .entries()
        .iter()
        .enumerate()
        .map(|(order, entry)| {
            let positions: Vec<usize> = reports
                .iter()
                .filter_map(|r| r.ranking.position_of(&entry.label))
                .collect();
            let score = positions.iter().map(|&p| 1.0 / p as f64).sum();
            let position_sum: usize = positions.iter().sum();
            let average_position =
                (!positions.is_empty()).then(|| position_sum as f64 / positions.len() as f64);
            let ranking = AggregateRanking {
                model: entry.model.clone(),
                score,
                mentions: positions.len(),
                average_position,
            };
            (order, ranking, positions.len())
        })
        .collect();

    rows.sort_by(|(order_a, a, mentions_a), (order_b, b, mentions_b)| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| mentions_b.cmp(mentions_a))
            .then_with(|| order_a.cmp(order_b))
    });

    rows.into_iter().map(|(_, ranking, _)| ranking).collect()
}
