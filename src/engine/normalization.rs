// * Metric Normalizer
// * Sanitizes raw page metrics and rescales them to a common [0, 1] range

use crate::config::constants::*;

// * Scored and reported page metrics with their sanitization rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Impressions,
    Clicks,
    Position,
    LinkScore,
    CrawlDepth,
    UniqueInlinks,
}

// * Whether a larger raw value is more desirable for the priority score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl MetricKind {
    /// Value substituted for a missing or non-finite measurement
    pub fn default_value(self) -> f64 {
        match self {
            MetricKind::Impressions => DEFAULT_IMPRESSIONS,
            MetricKind::Clicks => DEFAULT_CLICKS,
            MetricKind::Position => DEFAULT_POSITION,
            MetricKind::LinkScore => DEFAULT_LINK_SCORE,
            MetricKind::CrawlDepth => DEFAULT_CRAWL_DEPTH,
            MetricKind::UniqueInlinks => DEFAULT_UNIQUE_INLINKS,
        }
    }

    /// Inclusive valid domain of the metric
    pub fn domain(self) -> (f64, f64) {
        match self {
            MetricKind::Position => (POSITION_MIN, POSITION_MAX),
            MetricKind::LinkScore => (LINK_SCORE_MIN, LINK_SCORE_MAX),
            MetricKind::Impressions
            | MetricKind::Clicks
            | MetricKind::CrawlDepth
            | MetricKind::UniqueInlinks => (0.0, f64::MAX),
        }
    }

    pub fn polarity(self) -> Polarity {
        match self {
            MetricKind::Position | MetricKind::LinkScore | MetricKind::CrawlDepth => {
                Polarity::LowerIsBetter
            }
            MetricKind::Impressions | MetricKind::Clicks | MetricKind::UniqueInlinks => {
                Polarity::HigherIsBetter
            }
        }
    }

    /// Fills missing values and clips to the valid domain
    pub fn sanitize(self, value: f64) -> f64 {
        // * NaN and infinities count as missing
        if !value.is_finite() {
            return self.default_value();
        }
        let (min, max) = self.domain();
        value.clamp(min, max)
    }
}

/// Maps "lower is better" values so that larger output means more desirable
pub fn inverse_transform(value: f64) -> f64 {
    1.0 / (value + 1.0)
}

/// Rescales values to [0, 1] with `(x - min) / (max - min)`
///
/// A zero-variance column carries no discriminating information and maps to
/// all zeros. Any non-finite result is reported as 0.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .map(|v| {
            let scaled = (v - min) / range;
            if scaled.is_finite() {
                scaled
            } else {
                0.0
            }
        })
        .collect()
}

/// Sanitizes, orients and rescales one metric column
pub fn normalize_metric(kind: MetricKind, raw: &[f64]) -> Vec<f64> {
    let oriented: Vec<f64> = raw
        .iter()
        .map(|v| {
            let clean = kind.sanitize(*v);
            match kind.polarity() {
                Polarity::HigherIsBetter => clean,
                Polarity::LowerIsBetter => inverse_transform(clean),
            }
        })
        .collect();
    min_max_normalize(&oriented)
}

/// Median of the values, averaging the two central values for even counts
///
/// Returns `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
