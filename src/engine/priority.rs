// * Priority Scorer
// * Combines normalized page metrics into one weighted priority score per page

use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

use crate::config::PriorityWeights;
use crate::engine::normalization::{median, normalize_metric, MetricKind};
use crate::persistence::schema::{Page, PageSet};

/// Page with sanitized metrics and its computed priority
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPage {
    pub page: Page,
    pub norm_impressions: f64,
    pub norm_position: f64,
    pub norm_link_score: f64,
    pub norm_depth: f64,
    pub priority_score: f64,
    pub has_potential: bool,
}

impl ScoredPage {
    pub fn address(&self) -> &str {
        &self.page.address
    }
}

/// Pages sorted by priority score, highest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorityTable {
    rows: Vec<ScoredPage>,
    link_score_median: Option<f64>,
}

impl PriorityTable {
    pub fn rows(&self) -> &[ScoredPage] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredPage> {
        self.rows.iter()
    }

    /// Highest-priority `n` pages
    pub fn top(&self, n: usize) -> &[ScoredPage] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Dataset-wide median of sanitized link scores
    pub fn link_score_median(&self) -> Option<f64> {
        self.link_score_median
    }

    pub fn get(&self, address: &str) -> Option<&ScoredPage> {
        self.rows.iter().find(|row| row.address() == address)
    }
}

/// Scorer holding the priority weights and the potential-flag position cutoff
#[derive(Debug, Clone)]
pub struct PriorityScorer {
    weights: PriorityWeights,
    position_threshold: f64,
}

impl PriorityScorer {
    pub fn new(weights: PriorityWeights, position_threshold: f64) -> Self {
        Self {
            weights,
            position_threshold,
        }
    }

    /// Scores every page and returns them sorted by priority, stable on ties
    pub fn score(&self, pages: &PageSet) -> PriorityTable {
        let sanitized: Vec<Page> = pages.iter().map(sanitize_page).collect();

        let column = |f: fn(&Page) -> f64| sanitized.iter().map(f).collect::<Vec<f64>>();
        let impressions = column(|p| p.impressions);
        let positions = column(|p| p.position);
        let link_scores = column(|p| p.link_score);
        let depths = column(|p| p.crawl_depth);

        let norm_impressions = normalize_metric(MetricKind::Impressions, &impressions);
        let norm_position = normalize_metric(MetricKind::Position, &positions);
        let norm_link_score = normalize_metric(MetricKind::LinkScore, &link_scores);
        let norm_depth = normalize_metric(MetricKind::CrawlDepth, &depths);

        let impressions_median = median(&impressions);
        let link_score_median = median(&link_scores);

        let mut rows: Vec<ScoredPage> = sanitized
            .into_iter()
            .enumerate()
            .map(|(i, page)| {
                let score = self.weights.impressions * norm_impressions[i]
                    + self.weights.position * norm_position[i]
                    + self.weights.link_score * norm_link_score[i]
                    + self.weights.depth * norm_depth[i];
                let has_potential =
                    self.has_potential(&page, impressions_median, link_score_median);

                ScoredPage {
                    page,
                    norm_impressions: norm_impressions[i],
                    norm_position: norm_position[i],
                    norm_link_score: norm_link_score[i],
                    norm_depth: norm_depth[i],
                    priority_score: if score.is_nan() { 0.0 } else { score },
                    has_potential,
                }
            })
            .collect();

        // * sort_by is stable: equal scores keep input order
        rows.sort_by(|a, b| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(Ordering::Equal)
        });

        debug!(
            pages = rows.len(),
            link_score_median = ?link_score_median,
            with_potential = rows.iter().filter(|r| r.has_potential).count(),
            "Priority scores computed"
        );

        PriorityTable {
            rows,
            link_score_median,
        }
    }

    // * Search demand but weak ranking and weak internal support
    fn has_potential(
        &self,
        page: &Page,
        impressions_median: Option<f64>,
        link_score_median: Option<f64>,
    ) -> bool {
        match (impressions_median, link_score_median) {
            (Some(impressions), Some(link_score)) => {
                page.impressions > impressions
                    && page.position > self.position_threshold
                    && page.link_score < link_score
            }
            _ => false,
        }
    }
}

/// Copy of the page with every metric filled and clipped
pub fn sanitize_page(page: &Page) -> Page {
    Page {
        address: page.address.clone(),
        impressions: MetricKind::Impressions.sanitize(page.impressions),
        clicks: MetricKind::Clicks.sanitize(page.clicks),
        position: MetricKind::Position.sanitize(page.position),
        link_score: MetricKind::LinkScore.sanitize(page.link_score),
        crawl_depth: MetricKind::CrawlDepth.sanitize(page.crawl_depth),
        unique_inlinks: MetricKind::UniqueInlinks.sanitize(page.unique_inlinks),
        title: page.title.clone(),
        h1: page.h1.clone(),
    }
}
