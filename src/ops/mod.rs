// * Operations
// * Logging and metrics infrastructure for batch runs

pub mod telemetry;

pub use telemetry::{
    get_metrics_string, init_tracing, init_tracing_pretty, init_tracing_with_level,
    record_opportunities, record_pages_scored, record_pair_evaluations, record_stage_duration,
    set_vocabulary_size, PairOutcome, StageTimer,
};
