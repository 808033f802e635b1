// * Configuration Constants
// * Central location for all scoring weights, thresholds and sanitization defaults

// * Priority score weights (sum to 1.0)
pub const PRIORITY_WEIGHT_IMPRESSIONS: f64 = 0.3;
pub const PRIORITY_WEIGHT_POSITION: f64 = 0.2;
pub const PRIORITY_WEIGHT_LINK_SCORE: f64 = 0.3;
pub const PRIORITY_WEIGHT_DEPTH: f64 = 0.2;

// * Opportunity score weights (sum to 1.0)
pub const OPPORTUNITY_WEIGHT_SOURCE_STRENGTH: f64 = 0.4;
pub const OPPORTUNITY_WEIGHT_SIMILARITY: f64 = 0.4;
pub const OPPORTUNITY_WEIGHT_OUTLINKS_PENALTY: f64 = 0.1;
pub const OPPORTUNITY_WEIGHT_TARGET_NEED: f64 = 0.1;

// * Number of top-priority pages considered as link targets
pub const TOP_N_TARGETS: usize = 50;

// * Maximum suggestions kept per target after sorting
pub const TOP_K_PER_TARGET: usize = 10;

// * Minimum cosine similarity for a source/target pair
pub const MIN_SIMILARITY: f64 = 0.1;

// * Outlink count at which the outlinks penalty halves the score component
pub const MAX_OUTLINKS_REFERENCE: f64 = 100.0;

// * Pages ranking worse than this position can carry the potential flag
pub const POTENTIAL_POSITION_THRESHOLD: f64 = 10.0;

// * Vocabulary cap for the similarity vectorizer
pub const MAX_FEATURES: usize = 1000;

// * Tolerance when checking that a weight group sums to 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

// * Sanitization defaults for missing metric values
pub const DEFAULT_IMPRESSIONS: f64 = 0.0;
pub const DEFAULT_CLICKS: f64 = 0.0;
pub const DEFAULT_POSITION: f64 = 100.0;
pub const DEFAULT_LINK_SCORE: f64 = 0.0;
pub const DEFAULT_CRAWL_DEPTH: f64 = 1.0;
pub const DEFAULT_UNIQUE_INLINKS: f64 = 0.0;

// * Valid metric domains
pub const POSITION_MIN: f64 = 1.0;
pub const POSITION_MAX: f64 = 100.0;
pub const LINK_SCORE_MIN: f64 = 0.0;
pub const LINK_SCORE_MAX: f64 = 100.0;
