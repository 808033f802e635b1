// * Statistics Aggregator
// * Dataset-wide summary figures for the report

use serde::Serialize;

use crate::engine::priority::sanitize_page;
use crate::persistence::schema::{EdgeSet, PageSet};

/// Summary of the analyzed site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_pages: usize,
    pub avg_link_score: f64,
    pub avg_depth: f64,
    pub avg_inlinks: f64,
    /// Pages with at least one impression
    pub pages_with_gsc: usize,
    pub total_impressions: f64,
    pub total_clicks: f64,
    /// Raw edge rows; absent when no edge table was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_internal_links: Option<usize>,
}

/// Computes statistics over sanitized metrics; means are 0 for an empty set
pub fn compute_statistics(pages: &PageSet, edges: Option<&EdgeSet>) -> Statistics {
    let sanitized: Vec<_> = pages.iter().map(sanitize_page).collect();
    let total = sanitized.len();

    let mean = |sum: f64| if total == 0 { 0.0 } else { sum / total as f64 };

    Statistics {
        total_pages: total,
        avg_link_score: mean(sanitized.iter().map(|p| p.link_score).sum()),
        avg_depth: mean(sanitized.iter().map(|p| p.crawl_depth).sum()),
        avg_inlinks: mean(sanitized.iter().map(|p| p.unique_inlinks).sum()),
        pages_with_gsc: sanitized.iter().filter(|p| p.impressions > 0.0).count(),
        total_impressions: sanitized.iter().map(|p| p.impressions).sum(),
        total_clicks: sanitized.iter().map(|p| p.clicks).sum(),
        total_internal_links: edges.map(EdgeSet::len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::schema::{LinkEdge, Page};

    #[test]
    fn test_empty_set_has_zero_means() {
        let stats = compute_statistics(&PageSet::default(), None);
        assert_eq!(stats.total_pages, 0);
        assert_eq!(stats.avg_link_score, 0.0);
        assert_eq!(stats.avg_depth, 0.0);
        assert_eq!(stats.total_internal_links, None);
    }

    #[test]
    fn test_aggregates() {
        let pages = PageSet::new(vec![
            Page::new("/a")
                .with_link_score(20.0)
                .with_crawl_depth(1.0)
                .with_impressions(100.0)
                .with_clicks(4.0),
            Page::new("/b")
                .with_link_score(40.0)
                .with_crawl_depth(3.0)
                .with_unique_inlinks(6.0),
        ])
        .unwrap();
        let edges = EdgeSet::new(vec![
            LinkEdge::new("/a", "/b"),
            LinkEdge::new("/a", "/b"),
        ])
        .unwrap();

        let stats = compute_statistics(&pages, Some(&edges));
        assert_eq!(stats.total_pages, 2);
        assert_eq!(stats.avg_link_score, 30.0);
        assert_eq!(stats.avg_depth, 2.0);
        assert_eq!(stats.avg_inlinks, 3.0);
        assert_eq!(stats.pages_with_gsc, 1);
        assert_eq!(stats.total_impressions, 100.0);
        assert_eq!(stats.total_clicks, 4.0);
        assert_eq!(stats.total_internal_links, Some(2));
    }

    #[test]
    fn test_missing_values_use_defaults() {
        let pages = PageSet::new(vec![Page::new("/a").with_impressions(f64::NAN)]).unwrap();
        let stats = compute_statistics(&pages, None);
        assert_eq!(stats.total_impressions, 0.0);
        assert_eq!(stats.pages_with_gsc, 0);
    }
}
