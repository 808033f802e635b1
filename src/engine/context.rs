// * Scoring Context
// * Immutable priority table and similarity matrix tagged with a content fingerprint

use xxhash_rust::xxh64::xxh64;

use crate::config::{EngineConfig, TextSource};
use crate::engine::priority::PriorityTable;
use crate::engine::similarity::SimilarityMatrix;
use crate::persistence::schema::PageSet;

/// Precomputed tables for one page set
///
/// Built once and never mutated; a changed page set needs a new context.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    priority: PriorityTable,
    similarity: SimilarityMatrix,
    fingerprint: u64,
}

impl ScoringContext {
    pub fn new(priority: PriorityTable, similarity: SimilarityMatrix, fingerprint: u64) -> Self {
        Self {
            priority,
            similarity,
            fingerprint,
        }
    }

    pub fn priority(&self) -> &PriorityTable {
        &self.priority
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Returns true if the context was built from this exact page set and config
    pub fn is_current_for(&self, pages: &PageSet, config: &EngineConfig) -> bool {
        self.fingerprint == compute_fingerprint(pages, config)
    }
}

/// Hash of every page field and the settings the tables depend on
pub fn compute_fingerprint(pages: &PageSet, config: &EngineConfig) -> u64 {
    let mut canonical = String::new();
    for page in pages.iter() {
        canonical.push_str(&page.address);
        canonical.push('\u{1f}');
        for value in [
            page.impressions,
            page.clicks,
            page.position,
            page.link_score,
            page.crawl_depth,
            page.unique_inlinks,
        ] {
            canonical.push_str(&value.to_bits().to_string());
            canonical.push(',');
        }
        canonical.push_str(page.title.as_deref().unwrap_or(""));
        canonical.push('\u{1f}');
        canonical.push_str(page.h1.as_deref().unwrap_or(""));
        canonical.push('\u{1e}');
    }

    let text_source = match config.text_source {
        TextSource::Address => "address",
        TextSource::Combined => "combined",
    };
    let w = &config.priority_weights;
    canonical.push_str(&format!(
        "{}|{}|{}|{}|{}|{}|{}",
        text_source,
        config.max_features,
        config.potential_position_threshold.to_bits(),
        w.impressions.to_bits(),
        w.position.to_bits(),
        w.link_score.to_bits(),
        w.depth.to_bits(),
    ));

    xxh64(canonical.as_bytes(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::schema::Page;

    fn pages(score: f64) -> PageSet {
        PageSet::new(vec![Page::new("/a").with_link_score(score), Page::new("/b")]).unwrap()
    }

    #[test]
    fn test_fingerprint_consistency() {
        let config = EngineConfig::default();
        assert_eq!(
            compute_fingerprint(&pages(10.0), &config),
            compute_fingerprint(&pages(10.0), &config)
        );
    }

    #[test]
    fn test_fingerprint_changes_with_pages() {
        let config = EngineConfig::default();
        assert_ne!(
            compute_fingerprint(&pages(10.0), &config),
            compute_fingerprint(&pages(11.0), &config)
        );
    }

    #[test]
    fn test_context_tracks_its_page_set() {
        let config = EngineConfig::default();
        let context = ScoringContext::new(
            PriorityTable::default(),
            SimilarityMatrix::default(),
            compute_fingerprint(&pages(10.0), &config),
        );
        assert!(context.is_current_for(&pages(10.0), &config));
        assert!(!context.is_current_for(&pages(20.0), &config));
    }

    #[test]
    fn test_fingerprint_changes_with_text_source() {
        let combined = EngineConfig {
            text_source: TextSource::Combined,
            ..EngineConfig::default()
        };
        assert_ne!(
            compute_fingerprint(&pages(10.0), &EngineConfig::default()),
            compute_fingerprint(&pages(10.0), &combined)
        );
    }
}
