// * Telemetry - JSON Logging and Prometheus Metrics
// * Structured logging and batch-run metrics for the scoring pipeline

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter,
    CounterVec, Encoder, Gauge, HistogramVec, TextEncoder,
};
use std::time::Instant;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

lazy_static! {
    // * Pages passed through the priority scorer
    pub static ref PAGES_SCORED_TOTAL: Counter = register_counter!(
        "interlink_pages_scored_total",
        "Total number of pages scored for priority"
    ).unwrap();

    // * Source/target pair evaluations by outcome
    pub static ref PAIR_EVALUATIONS_TOTAL: CounterVec = register_counter_vec!(
        "interlink_pair_evaluations_total",
        "Source/target pair evaluations by outcome",
        &["outcome"]
    ).unwrap();

    // * Opportunities emitted after the per-target cap
    pub static ref OPPORTUNITIES_TOTAL: Counter = register_counter!(
        "interlink_opportunities_total",
        "Total number of link opportunities emitted"
    ).unwrap();

    // * Pipeline stage duration histogram
    pub static ref STAGE_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "interlink_stage_duration_seconds",
        "Pipeline stage duration in seconds",
        &["stage"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]
    ).unwrap();

    // * Terms kept by the similarity vectorizer
    pub static ref SIMILARITY_VOCABULARY_SIZE: Gauge = register_gauge!(
        "interlink_similarity_vocabulary_size",
        "Number of terms in the similarity vocabulary"
    ).unwrap();
}

/// Outcome label of one pair evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Accepted,
    ExistingLink,
    BelowSimilarity,
}

impl PairOutcome {
    pub fn as_label(self) -> &'static str {
        match self {
            PairOutcome::Accepted => "accepted",
            PairOutcome::ExistingLink => "existing_link",
            PairOutcome::BelowSimilarity => "below_similarity",
        }
    }
}

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use interlink::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(pages = 120, "Scoring pages");
/// ```
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initializes tracing with custom log level
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // * try_init: a second initialization (tests, embedding) is not an error
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .try_init();
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty())
        .try_init();
}

/// Returns the current metrics in the Prometheus text format
pub fn get_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_pages_scored(count: usize) {
    PAGES_SCORED_TOTAL.inc_by(count as f64);
}

pub fn record_pair_evaluations(outcome: PairOutcome, count: usize) {
    if count > 0 {
        PAIR_EVALUATIONS_TOTAL
            .with_label_values(&[outcome.as_label()])
            .inc_by(count as f64);
    }
}

pub fn record_opportunities(count: usize) {
    OPPORTUNITIES_TOTAL.inc_by(count as f64);
}

pub fn set_vocabulary_size(size: usize) {
    SIMILARITY_VOCABULARY_SIZE.set(size as f64);
}

pub fn record_stage_duration(stage: &str, seconds: f64) {
    STAGE_DURATION_SECONDS
        .with_label_values(&[stage])
        .observe(seconds);
}

/// Times one pipeline stage and records it when dropped
pub struct StageTimer {
    stage: &'static str,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            started: Instant::now(),
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed().as_secs_f64();
        record_stage_duration(self.stage, elapsed);
        tracing::debug!(stage = self.stage, elapsed_secs = elapsed, "Stage finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_outcome_labels() {
        assert_eq!(PairOutcome::Accepted.as_label(), "accepted");
        assert_eq!(PairOutcome::ExistingLink.as_label(), "existing_link");
        assert_eq!(PairOutcome::BelowSimilarity.as_label(), "below_similarity");
    }

    #[test]
    fn test_metrics_exposed() {
        record_pages_scored(3);
        record_pair_evaluations(PairOutcome::Accepted, 1);
        record_opportunities(1);
        set_vocabulary_size(12);
        drop(StageTimer::start("test"));

        let metrics = get_metrics_string();
        assert!(metrics.contains("interlink_pages_scored_total"));
        assert!(metrics.contains("interlink_pair_evaluations_total"));
        assert!(metrics.contains("interlink_similarity_vocabulary_size"));
        assert!(metrics.contains("interlink_stage_duration_seconds"));
    }

    #[test]
    fn test_pair_evaluations_recorded_in_bulk() {
        let counter = PAIR_EVALUATIONS_TOTAL.with_label_values(&["below_similarity"]);
        let before = counter.get();
        record_pair_evaluations(PairOutcome::BelowSimilarity, 7);
        record_pair_evaluations(PairOutcome::BelowSimilarity, 0);
        assert!(counter.get() - before >= 7.0);
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing();
        init_tracing_pretty();
    }
}
