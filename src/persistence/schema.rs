// * Page & Link Schema
// * Typed tables handed from the ingestion layer to the scoring engine

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("No page table supplied")]
    MissingPageTable,

    #[error("Empty address at row {row}")]
    EmptyAddress { row: usize },

    #[error("Empty {field} address in link edge at row {row}")]
    EmptyEdgeEndpoint { row: usize, field: &'static str },

    #[error("Missing required column '{column}' in {table}")]
    MissingColumn { table: &'static str, column: &'static str },
}

/// One crawled page with its crawl and search metrics
///
/// # Fields
/// - `address`: Unique, case-sensitive page address
/// - `impressions`, `clicks`: Search performance counts
/// - `position`: Average search position (1 = best, 100 = worst)
/// - `link_score`: Internal link strength on a 0-100 scale
/// - `crawl_depth`: Click distance from the site root
/// - `unique_inlinks`: Number of distinct internal pages linking here
///
/// Metric values are raw; NaN or infinite values mark a missing measurement
/// and are replaced by the engine's sanitization defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub address: String,
    pub impressions: f64,
    pub clicks: f64,
    pub position: f64,
    pub link_score: f64,
    pub crawl_depth: f64,
    pub unique_inlinks: f64,
    pub title: Option<String>,
    pub h1: Option<String>,
}

impl Page {
    /// Creates a page with worst-case search metrics and no internal support
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            impressions: 0.0,
            clicks: 0.0,
            position: 100.0,
            link_score: 0.0,
            crawl_depth: 1.0,
            unique_inlinks: 0.0,
            title: None,
            h1: None,
        }
    }

    pub fn with_impressions(mut self, impressions: f64) -> Self {
        self.impressions = impressions;
        self
    }

    pub fn with_clicks(mut self, clicks: f64) -> Self {
        self.clicks = clicks;
        self
    }

    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    pub fn with_link_score(mut self, link_score: f64) -> Self {
        self.link_score = link_score;
        self
    }

    pub fn with_crawl_depth(mut self, crawl_depth: f64) -> Self {
        self.crawl_depth = crawl_depth;
        self
    }

    pub fn with_unique_inlinks(mut self, unique_inlinks: f64) -> Self {
        self.unique_inlinks = unique_inlinks;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_h1(mut self, h1: impl Into<String>) -> Self {
        self.h1 = Some(h1.into());
        self
    }
}

/// Existing internal hyperlink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub source: String,
    pub destination: String,
    pub anchor: Option<String>,
}

impl LinkEdge {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }
}

/// Validated page table: non-empty, unique addresses in input order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSet {
    pages: Vec<Page>,
}

impl PageSet {
    /// Validates pages and keeps the first occurrence of each address
    pub fn new(pages: Vec<Page>) -> Result<Self, SchemaError> {
        let mut seen: HashSet<String> = HashSet::with_capacity(pages.len());
        let mut unique = Vec::with_capacity(pages.len());
        let total = pages.len();

        for (row, page) in pages.into_iter().enumerate() {
            if page.address.trim().is_empty() {
                return Err(SchemaError::EmptyAddress { row });
            }
            if seen.insert(page.address.clone()) {
                unique.push(page);
            }
        }

        let dropped = total - unique.len();
        if dropped > 0 {
            info!(dropped = dropped, kept = unique.len(), "Dropped duplicate page addresses");
        }

        Ok(Self { pages: unique })
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Page> {
        self.pages.iter()
    }

    pub fn get(&self, address: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.address == address)
    }
}

/// Existing link edges with lookup structures for the opportunity search
#[derive(Debug, Clone, Default)]
pub struct EdgeSet {
    edges: Vec<LinkEdge>,
    // * Source -> distinct destinations
    existing: HashMap<String, HashSet<String>>,
}

impl EdgeSet {
    pub fn new(edges: Vec<LinkEdge>) -> Result<Self, SchemaError> {
        let mut existing: HashMap<String, HashSet<String>> = HashMap::new();

        for (row, edge) in edges.iter().enumerate() {
            if edge.source.trim().is_empty() {
                return Err(SchemaError::EmptyEdgeEndpoint { row, field: "source" });
            }
            if edge.destination.trim().is_empty() {
                return Err(SchemaError::EmptyEdgeEndpoint { row, field: "destination" });
            }
            existing
                .entry(edge.source.clone())
                .or_default()
                .insert(edge.destination.clone());
        }

        let set = Self { edges, existing };
        debug!(
            rows = set.len(),
            distinct = set.distinct_len(),
            sources = set.existing.len(),
            "Indexed link edges"
        );
        Ok(set)
    }

    /// Returns true if `source` already links to `destination`
    pub fn contains(&self, source: &str, destination: &str) -> bool {
        self.existing
            .get(source)
            .is_some_and(|targets| targets.contains(destination))
    }

    /// Number of distinct pages `source` links to
    pub fn outlink_count(&self, source: &str) -> usize {
        self.existing.get(source).map_or(0, HashSet::len)
    }

    /// Raw edge rows, duplicates included
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn distinct_len(&self) -> usize {
        self.existing.values().map(HashSet::len).sum()
    }

    pub fn edges(&self) -> &[LinkEdge] {
        &self.edges
    }
}

/// Everything the engine consumes from the ingestion collaborator
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub pages: PageSet,
    pub edges: Option<EdgeSet>,
}

impl AnalysisInput {
    pub fn builder() -> AnalysisInputBuilder {
        AnalysisInputBuilder::default()
    }
}

/// Builder that refuses to produce an input without a page table
#[derive(Debug, Default)]
pub struct AnalysisInputBuilder {
    pages: Option<Vec<Page>>,
    edges: Option<Vec<LinkEdge>>,
}

impl AnalysisInputBuilder {
    pub fn pages(mut self, pages: Vec<Page>) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn edges(mut self, edges: Vec<LinkEdge>) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn maybe_edges(mut self, edges: Option<Vec<LinkEdge>>) -> Self {
        self.edges = edges;
        self
    }

    pub fn build(self) -> Result<AnalysisInput, SchemaError> {
        let pages = PageSet::new(self.pages.ok_or(SchemaError::MissingPageTable)?)?;
        let edges = self.edges.map(EdgeSet::new).transpose()?;
        if edges.is_none() {
            info!("No link edge table supplied; existing-link checks disabled");
        }
        Ok(AnalysisInput { pages, edges })
    }
}
