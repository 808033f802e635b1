// * Scoring Engine
// * Priority, similarity and link-opportunity pipeline over one site snapshot

pub mod context;
pub mod filters;
pub mod normalization;
pub mod opportunity;
pub mod priority;
pub mod similarity;
pub mod statistics;

pub use context::{compute_fingerprint, ScoringContext};
pub use filters::{OpportunityFilter, PriorityFilter};
pub use opportunity::{Opportunity, OpportunityGenerator, OpportunityTable, PairTally};
pub use priority::{PriorityScorer, PriorityTable, ScoredPage};
pub use similarity::{AddressIndex, SimilarityEngine, SimilarityMatrix};
pub use statistics::{compute_statistics, Statistics};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::ops::telemetry::{self, StageTimer};
use crate::persistence::schema::AnalysisInput;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Scoring context is stale (built for {context:#018x}, input is {current:#018x})")]
    StaleContext { context: u64, current: u64 },
}

/// Everything one batch run produces
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub priority: PriorityTable,
    pub opportunities: OpportunityTable,
    pub statistics: Statistics,
}

/// Facade over the scoring pipeline for one validated input
#[derive(Debug, Clone)]
pub struct Analyzer {
    input: AnalysisInput,
    config: EngineConfig,
}

impl Analyzer {
    pub fn new(input: AnalysisInput, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { input, config })
    }

    pub fn input(&self) -> &AnalysisInput {
        &self.input
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn priority_table(&self) -> PriorityTable {
        let _timer = StageTimer::start("priority");
        let scorer = PriorityScorer::new(
            self.config.priority_weights,
            self.config.potential_position_threshold,
        );
        let table = scorer.score(&self.input.pages);
        telemetry::record_pages_scored(table.len());
        table
    }

    pub fn similarity_matrix(&self) -> SimilarityMatrix {
        let _timer = StageTimer::start("similarity");
        let engine = SimilarityEngine::new(self.config.max_features, self.config.text_source);
        let matrix = engine.compute(&self.input.pages);
        telemetry::set_vocabulary_size(matrix.vocabulary_size());
        matrix
    }

    /// Computes both tables and fingerprints the page set they came from
    pub fn build_context(&self) -> ScoringContext {
        ScoringContext::new(
            self.priority_table(),
            self.similarity_matrix(),
            compute_fingerprint(&self.input.pages, &self.config),
        )
    }

    /// Generates opportunities from a context built for this analyzer's input
    pub fn link_opportunities(
        &self,
        context: &ScoringContext,
    ) -> Result<OpportunityTable, EngineError> {
        if !context.is_current_for(&self.input.pages, &self.config) {
            return Err(EngineError::StaleContext {
                context: context.fingerprint(),
                current: compute_fingerprint(&self.input.pages, &self.config),
            });
        }

        let _timer = StageTimer::start("opportunities");
        let generator = OpportunityGenerator::new(&self.config);
        Ok(generator.generate(
            context.priority(),
            context.similarity(),
            self.input.edges.as_ref(),
        ))
    }

    pub fn statistics(&self) -> Statistics {
        compute_statistics(&self.input.pages, self.input.edges.as_ref())
    }

    /// Runs the full pipeline
    pub fn run(&self) -> Result<AnalysisReport, EngineError> {
        info!(
            pages = self.input.pages.len(),
            edges = self.input.edges.as_ref().map(|e| e.len()),
            "Starting analysis"
        );
        let context = self.build_context();
        let opportunities = self.link_opportunities(&context)?;
        if opportunities.is_empty() {
            warn!("No link opportunities found");
        }
        let statistics = self.statistics();

        info!(
            priority_rows = context.priority().len(),
            opportunities = opportunities.len(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            priority: context.priority().clone(),
            opportunities,
            statistics,
        })
    }
}
