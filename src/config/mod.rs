// * Engine Configuration
// * Typed weights and thresholds with defaults, JSON loading and validation

pub mod constants;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use constants::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{group} weights must be non-negative and sum to 1.0 (got {sum})")]
    InvalidWeights { group: &'static str, sum: f64 },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Weights of the normalized metrics in the priority score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    pub impressions: f64,
    pub position: f64,
    pub link_score: f64,
    pub depth: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            impressions: PRIORITY_WEIGHT_IMPRESSIONS,
            position: PRIORITY_WEIGHT_POSITION,
            link_score: PRIORITY_WEIGHT_LINK_SCORE,
            depth: PRIORITY_WEIGHT_DEPTH,
        }
    }
}

impl PriorityWeights {
    fn values(&self) -> [f64; 4] {
        [self.impressions, self.position, self.link_score, self.depth]
    }
}

/// Weights of the components in the opportunity score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityWeights {
    pub source_strength: f64,
    pub similarity: f64,
    pub outlinks_penalty: f64,
    pub target_need: f64,
}

impl Default for OpportunityWeights {
    fn default() -> Self {
        Self {
            source_strength: OPPORTUNITY_WEIGHT_SOURCE_STRENGTH,
            similarity: OPPORTUNITY_WEIGHT_SIMILARITY,
            outlinks_penalty: OPPORTUNITY_WEIGHT_OUTLINKS_PENALTY,
            target_need: OPPORTUNITY_WEIGHT_TARGET_NEED,
        }
    }
}

impl OpportunityWeights {
    fn values(&self) -> [f64; 4] {
        [
            self.source_strength,
            self.similarity,
            self.outlinks_penalty,
            self.target_need,
        ]
    }
}

/// Which page text feeds the similarity corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Address only
    #[default]
    Address,
    /// Address followed by title and H1 when present
    Combined,
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub priority_weights: PriorityWeights,
    pub opportunity_weights: OpportunityWeights,
    pub top_n_targets: usize,
    pub top_k_per_target: usize,
    pub min_similarity: f64,
    pub max_outlinks_reference: f64,
    pub potential_position_threshold: f64,
    pub max_features: usize,
    pub text_source: TextSource,
    pub normalize_addresses: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            priority_weights: PriorityWeights::default(),
            opportunity_weights: OpportunityWeights::default(),
            top_n_targets: TOP_N_TARGETS,
            top_k_per_target: TOP_K_PER_TARGET,
            min_similarity: MIN_SIMILARITY,
            max_outlinks_reference: MAX_OUTLINKS_REFERENCE,
            potential_position_threshold: POTENTIAL_POSITION_THRESHOLD,
            max_features: MAX_FEATURES,
            text_source: TextSource::Address,
            normalize_addresses: false,
        }
    }
}

impl EngineConfig {
    /// Loads a configuration from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parses and validates a JSON configuration document
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks weights and thresholds for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_weights("priority", &self.priority_weights.values())?;
        check_weights("opportunity", &self.opportunity_weights.values())?;

        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(ConfigError::InvalidValue {
                field: "min_similarity",
                reason: format!("{} is outside [0, 1]", self.min_similarity),
            });
        }
        if !(self.max_outlinks_reference.is_finite() && self.max_outlinks_reference > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "max_outlinks_reference",
                reason: format!("{} must be a positive number", self.max_outlinks_reference),
            });
        }
        if !self.potential_position_threshold.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "potential_position_threshold",
                reason: "must be finite".to_string(),
            });
        }
        if self.top_k_per_target == 0 {
            return Err(ConfigError::InvalidValue {
                field: "top_k_per_target",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_features == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_features",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn check_weights(group: &'static str, weights: &[f64]) -> Result<(), ConfigError> {
    let sum: f64 = weights.iter().sum();
    let all_valid = weights.iter().all(|w| w.is_finite() && *w >= 0.0);
    if !all_valid || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::InvalidWeights { group, sum });
    }
    Ok(())
}
