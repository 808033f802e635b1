use interlink::config::EngineConfig;
use interlink::engine::{Analyzer, EngineError, OpportunityFilter, OpportunityTable};
use interlink::persistence::{AnalysisInput, LinkEdge, Page};
use proptest::prelude::*;
use std::collections::HashMap;

// * Test Suite for Link Opportunity Generation

fn site() -> Vec<Page> {
    vec![
        Page::new("https://shop.test/shoes/running")
            .with_impressions(1000.0)
            .with_position(20.0)
            .with_link_score(10.0)
            .with_crawl_depth(3.0)
            .with_unique_inlinks(1.0),
        Page::new("https://shop.test/shoes/trail-running")
            .with_position(100.0)
            .with_link_score(90.0)
            .with_crawl_depth(1.0)
            .with_unique_inlinks(40.0),
        Page::new("https://shop.test/shoes/running-guide")
            .with_impressions(50.0)
            .with_position(30.0)
            .with_link_score(80.0)
            .with_crawl_depth(2.0),
        Page::new("https://shop.test/about")
            .with_link_score(70.0)
            .with_crawl_depth(1.0),
        Page::new("https://shop.test/contact")
            .with_link_score(5.0)
            .with_crawl_depth(1.0),
    ]
}

fn analyzer(pages: Vec<Page>, edges: Option<Vec<LinkEdge>>, config: EngineConfig) -> Analyzer {
    let input = AnalysisInput::builder()
        .pages(pages)
        .maybe_edges(edges)
        .build()
        .unwrap();
    Analyzer::new(input, config).unwrap()
}

fn opportunities(analyzer: &Analyzer) -> OpportunityTable {
    let context = analyzer.build_context();
    analyzer.link_opportunities(&context).unwrap()
}

#[test]
fn test_opportunities_respect_invariants() {
    let config = EngineConfig::default();
    let edges = vec![LinkEdge::new(
        "https://shop.test/shoes/trail-running",
        "https://shop.test/about",
    )];
    let analyzer = analyzer(site(), Some(edges), config.clone());
    let table = opportunities(&analyzer);
    assert!(!table.is_empty());

    // * Link score median of {10, 90, 80, 70, 5} is 70
    let mut per_target: HashMap<&str, usize> = HashMap::new();
    for o in table.iter() {
        assert_ne!(o.source, o.target);
        assert!(o.source_link_score > 70.0);
        assert!(o.similarity >= config.min_similarity);
        assert!(o.similarity <= 1.0);
        let expected = 0.4 * o.source_link_score / 100.0
            + 0.4 * o.similarity
            + 0.1 / (1.0 + o.source_outlinks as f64 / 100.0)
            + 0.1 / (1.0 + o.target_inlinks);
        assert!((o.opportunity_score - expected).abs() < 1e-12);
        *per_target.entry(o.target.as_str()).or_insert(0) += 1;
    }
    assert!(per_target.values().all(|n| *n <= config.top_k_per_target));

    let scores: Vec<f64> = table.iter().map(|o| o.opportunity_score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_high_priority_target_gets_related_sources() {
    let analyzer = analyzer(site(), None, EngineConfig::default());
    let table = opportunities(&analyzer);
    let sources: Vec<&str> = table
        .for_target("https://shop.test/shoes/running")
        .map(|o| o.source.as_str())
        .collect();
    assert!(sources.contains(&"https://shop.test/shoes/trail-running"));
    assert!(sources.contains(&"https://shop.test/shoes/running-guide"));
    assert!(!sources.contains(&"https://shop.test/about"));
}

#[test]
fn test_existing_link_is_suppressed_in_one_direction_only() {
    let target = "https://shop.test/shoes/running";
    let source = "https://shop.test/shoes/trail-running";

    let forward = analyzer(
        site(),
        Some(vec![LinkEdge::new(source, target)]),
        EngineConfig::default(),
    );
    assert!(!opportunities(&forward)
        .iter()
        .any(|o| o.source == source && o.target == target));

    // * B -> A existing does not block A -> B
    let reverse = analyzer(
        site(),
        Some(vec![LinkEdge::new(target, source)]),
        EngineConfig::default(),
    );
    assert!(opportunities(&reverse)
        .iter()
        .any(|o| o.source == source && o.target == target));
}

#[test]
fn test_outlinks_count_distinct_destinations() {
    let source = "https://shop.test/shoes/running-guide";
    let edges = vec![
        LinkEdge::new(source, "https://shop.test/about"),
        LinkEdge::new(source, "https://shop.test/about"),
        LinkEdge::new(source, "https://shop.test/contact"),
    ];
    let analyzer = analyzer(site(), Some(edges), EngineConfig::default());
    let table = opportunities(&analyzer);
    let row = table
        .iter()
        .find(|o| o.source == source)
        .expect("guide page should be proposed as a source");
    assert_eq!(row.source_outlinks, 2);
    assert_eq!(analyzer.statistics().total_internal_links, Some(3));
}

#[test]
fn test_per_target_cap() {
    let config = EngineConfig {
        top_k_per_target: 1,
        ..EngineConfig::default()
    };
    let analyzer = analyzer(site(), None, config);
    let table = opportunities(&analyzer);
    assert_eq!(table.for_target("https://shop.test/shoes/running").count(), 1);
}

#[test]
fn test_uniform_link_scores_yield_no_sources() {
    let pages = vec![
        Page::new("/blue-widgets").with_link_score(50.0),
        Page::new("/blue-widgets-sale").with_link_score(50.0),
        Page::new("/blue-widgets-guide").with_link_score(50.0),
    ];
    let report = analyzer(pages, None, EngineConfig::default()).run().unwrap();
    assert!(report.opportunities.is_empty());
    assert_eq!(report.priority.len(), 3);
}

#[test]
fn test_high_similarity_threshold_yields_empty_result() {
    let config = EngineConfig {
        min_similarity: 1.0,
        ..EngineConfig::default()
    };
    let table = opportunities(&analyzer(site(), None, config));
    assert!(table.is_empty());
}

#[test]
fn test_changed_page_set_requires_new_context() {
    let before = analyzer(site(), None, EngineConfig::default());
    let context = before.build_context();

    let mut pages = site();
    pages.push(Page::new("https://shop.test/shoes/running-socks").with_link_score(95.0));
    let after = analyzer(pages, None, EngineConfig::default());

    assert!(matches!(
        after.link_opportunities(&context),
        Err(EngineError::StaleContext { .. })
    ));
    let fresh = after.build_context();
    assert!(after.link_opportunities(&fresh).is_ok());
}

fn keyed(table: &OpportunityTable) -> Vec<(String, String, f64)> {
    let mut rows: Vec<(String, String, f64)> = table
        .iter()
        .map(|o| (o.source.clone(), o.target.clone(), o.opportunity_score))
        .collect();
    rows.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
    rows
}

proptest! {
    #[test]
    fn prop_row_order_does_not_change_opportunities(pages in Just(site()).prop_shuffle()) {
        let baseline = keyed(&opportunities(&analyzer(site(), None, EngineConfig::default())));
        let shuffled = keyed(&opportunities(&analyzer(pages, None, EngineConfig::default())));
        prop_assert_eq!(baseline.len(), shuffled.len());
        for (a, b) in baseline.iter().zip(shuffled.iter()) {
            prop_assert_eq!(&a.0, &b.0);
            prop_assert_eq!(&a.1, &b.1);
            prop_assert!((a.2 - b.2).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_filter_is_idempotent_and_ordered(
        min_similarity in 0.0f64..1.0,
        min_source_link_score in 0.0f64..100.0,
    ) {
        let table = opportunities(&analyzer(site(), None, EngineConfig::default()));
        let filter = OpportunityFilter {
            min_similarity: Some(min_similarity),
            min_source_link_score: Some(min_source_link_score),
        };
        let once = filter.apply(&table);
        prop_assert_eq!(filter.apply(&once), once.clone());

        // * Kept rows appear in the same relative order as the source table
        let mut cursor = table.iter();
        for row in once.iter() {
            prop_assert!(cursor.any(|o| o == row));
        }
    }
}
