// * Opportunity Generator
// * Proposes source -> target links for high-priority pages

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::{EngineConfig, OpportunityWeights};
use crate::engine::priority::{PriorityTable, ScoredPage};
use crate::engine::similarity::SimilarityMatrix;
use crate::ops::telemetry::{self, PairOutcome};
use crate::persistence::schema::EdgeSet;

/// Proposed internal link with its score components and page details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub source: String,
    pub target: String,
    pub source_link_score: f64,
    pub target_link_score: f64,
    pub target_priority_score: f64,
    pub similarity: f64,
    pub source_outlinks: usize,
    pub target_inlinks: f64,
    pub target_impressions: f64,
    pub target_position: f64,
    pub source_strength: f64,
    pub outlinks_penalty: f64,
    pub target_need: f64,
    pub opportunity_score: f64,
}

/// Opportunities sorted by score, highest first, capped per target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpportunityTable {
    rows: Vec<Opportunity>,
}

impl OpportunityTable {
    pub fn new(rows: Vec<Opportunity>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Opportunity] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Opportunity> {
        self.rows.iter()
    }

    /// Opportunities pointing at one target, in score order
    pub fn for_target<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Opportunity> {
        self.rows.iter().filter(move |o| o.target == target)
    }
}

/// Score components for one source/target pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub source_strength: f64,
    pub outlinks_penalty: f64,
    pub target_need: f64,
    pub total: f64,
}

/// Combines the four opportunity components with the configured weights
pub fn score_pair(
    weights: &OpportunityWeights,
    source_link_score: f64,
    similarity: f64,
    source_outlinks: usize,
    target_inlinks: f64,
    max_outlinks_reference: f64,
) -> PairScore {
    let source_strength = source_link_score / 100.0;
    let outlinks_penalty = 1.0 / (1.0 + source_outlinks as f64 / max_outlinks_reference);
    let target_need = 1.0 / (1.0 + target_inlinks);
    let total = weights.source_strength * source_strength
        + weights.similarity * similarity
        + weights.outlinks_penalty * outlinks_penalty
        + weights.target_need * target_need;

    PairScore {
        source_strength,
        outlinks_penalty,
        target_need,
        total,
    }
}

/// Pair outcomes counted during one generation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairTally {
    pub accepted: usize,
    pub existing_link: usize,
    pub below_similarity: usize,
}

impl PairTally {
    pub fn add(&mut self, outcome: PairOutcome) {
        match outcome {
            PairOutcome::Accepted => self.accepted += 1,
            PairOutcome::ExistingLink => self.existing_link += 1,
            PairOutcome::BelowSimilarity => self.below_similarity += 1,
        }
    }

    pub fn record(&self) {
        telemetry::record_pair_evaluations(PairOutcome::Accepted, self.accepted);
        telemetry::record_pair_evaluations(PairOutcome::ExistingLink, self.existing_link);
        telemetry::record_pair_evaluations(PairOutcome::BelowSimilarity, self.below_similarity);
    }
}

#[derive(Debug, Clone)]
pub struct OpportunityGenerator {
    weights: OpportunityWeights,
    top_n_targets: usize,
    top_k_per_target: usize,
    min_similarity: f64,
    max_outlinks_reference: f64,
}

impl OpportunityGenerator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            weights: config.opportunity_weights,
            top_n_targets: config.top_n_targets,
            top_k_per_target: config.top_k_per_target,
            min_similarity: config.min_similarity,
            max_outlinks_reference: config.max_outlinks_reference,
        }
    }

    /// Evaluates every (source, target) pair and keeps the best per target
    ///
    /// Targets are the `top_n_targets` highest-priority pages. Sources are
    /// pages whose link score is strictly above the dataset median. Pairs that
    /// already link, or whose similarity is under the threshold, are skipped.
    pub fn generate(
        &self,
        priority: &PriorityTable,
        similarity: &SimilarityMatrix,
        edges: Option<&EdgeSet>,
    ) -> OpportunityTable {
        let Some(median) = priority.link_score_median() else {
            info!("No link score median; no source pages available");
            return OpportunityTable::default();
        };

        let sources: Vec<&ScoredPage> = priority
            .iter()
            .filter(|row| row.page.link_score > median)
            .collect();
        let targets = priority.top(self.top_n_targets);

        let mut rows = Vec::new();
        let mut tally = PairTally::default();
        for target in targets {
            let Some(target_row) = similarity.index().row_of(target.address()) else {
                continue;
            };
            for source in &sources {
                if source.address() == target.address() {
                    continue;
                }
                let Some(source_row) = similarity.index().row_of(source.address()) else {
                    continue;
                };
                if edges.is_some_and(|e| e.contains(source.address(), target.address())) {
                    tally.add(PairOutcome::ExistingLink);
                    continue;
                }
                let sim = similarity.get(source_row, target_row).unwrap_or(0.0);
                if sim < self.min_similarity {
                    tally.add(PairOutcome::BelowSimilarity);
                    continue;
                }
                tally.add(PairOutcome::Accepted);
                rows.push(self.build(source, target, sim, edges));
            }
        }

        tally.record();
        let evaluated = rows.len();
        // * Stable: equal scores keep target-then-source discovery order
        rows.sort_by(|a, b| {
            b.opportunity_score
                .partial_cmp(&a.opportunity_score)
                .unwrap_or(Ordering::Equal)
        });

        let mut per_target: HashMap<String, usize> = HashMap::new();
        rows.retain(|o| {
            let kept = per_target.entry(o.target.clone()).or_insert(0);
            *kept += 1;
            *kept <= self.top_k_per_target
        });

        debug!(
            targets = targets.len(),
            sources = sources.len(),
            accepted = evaluated,
            kept = rows.len(),
            "Link opportunities generated"
        );
        telemetry::record_opportunities(rows.len());

        OpportunityTable::new(rows)
    }

    fn build(
        &self,
        source: &ScoredPage,
        target: &ScoredPage,
        similarity: f64,
        edges: Option<&EdgeSet>,
    ) -> Opportunity {
        let source_outlinks = edges.map_or(0, |e| e.outlink_count(source.address()));
        let score = score_pair(
            &self.weights,
            source.page.link_score,
            similarity,
            source_outlinks,
            target.page.unique_inlinks,
            self.max_outlinks_reference,
        );

        Opportunity {
            source: source.address().to_string(),
            target: target.address().to_string(),
            source_link_score: source.page.link_score,
            target_link_score: target.page.link_score,
            target_priority_score: target.priority_score,
            similarity,
            source_outlinks,
            target_inlinks: target.page.unique_inlinks,
            target_impressions: target.page.impressions,
            target_position: target.page.position,
            source_strength: score.source_strength,
            outlinks_penalty: score.outlinks_penalty,
            target_need: score.target_need,
            opportunity_score: score.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_pair_components() {
        let score = score_pair(&OpportunityWeights::default(), 80.0, 0.5, 0, 0.0, 100.0);
        assert!((score.source_strength - 0.8).abs() < 1e-12);
        assert_eq!(score.outlinks_penalty, 1.0);
        assert_eq!(score.target_need, 1.0);
        assert!((score.total - (0.32 + 0.2 + 0.1 + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_outlinks_penalty_halves_at_reference() {
        let score = score_pair(&OpportunityWeights::default(), 50.0, 0.5, 100, 3.0, 100.0);
        assert!((score.outlinks_penalty - 0.5).abs() < 1e-12);
        assert!((score.target_need - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_pair_tally_counts_by_outcome() {
        let mut tally = PairTally::default();
        tally.add(PairOutcome::Accepted);
        tally.add(PairOutcome::ExistingLink);
        tally.add(PairOutcome::ExistingLink);
        tally.add(PairOutcome::BelowSimilarity);
        assert_eq!(
            tally,
            PairTally {
                accepted: 1,
                existing_link: 2,
                below_similarity: 1,
            }
        );
    }

    #[test]
    fn test_empty_table() {
        let table = OpportunityTable::default();
        assert!(table.is_empty());
        assert_eq!(table.for_target("/x").count(), 0);
    }
}
