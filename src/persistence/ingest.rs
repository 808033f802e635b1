// * CSV Ingestion
// * Loads crawl, search performance and inlink exports into an AnalysisInput

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::persistence::address::normalize_address;
use crate::persistence::schema::{AnalysisInput, LinkEdge, Page, SchemaError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub const CRAWL_TABLE: &str = "crawl";
pub const SEARCH_TABLE: &str = "search performance";
pub const INLINKS_TABLE: &str = "inlinks";

/// One row of the search performance export
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRow {
    pub page: String,
    pub clicks: f64,
    pub impressions: f64,
    pub position: f64,
}

// * Trimmed header name -> column index
struct Columns {
    table: &'static str,
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(table: &'static str, headers: &csv::StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_string(), idx))
            .collect();
        Self { table, index }
    }

    fn require(&self, column: &'static str) -> Result<usize, SchemaError> {
        self.index
            .get(column)
            .copied()
            .ok_or(SchemaError::MissingColumn {
                table: self.table,
                column,
            })
    }

    fn optional(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}

fn cell(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

fn optional_cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    idx.map(|i| cell(record, i))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parses a numeric cell; unparseable or empty cells are missing (NaN)
pub fn coerce_number(raw: &str) -> f64 {
    let cleaned = raw.trim().trim_end_matches('%').replace(',', "");
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}

/// Reads crawl rows, keeping only addressed status-200 indexable pages
pub fn read_crawl<R: Read>(reader: R) -> Result<Vec<Page>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::new(CRAWL_TABLE, csv_reader.headers()?);

    let address = columns.require("Address")?;
    let link_score = columns.require("Link Score")?;
    let inlinks = columns.require("Unique Inlinks")?;
    let depth = columns.require("Crawl Depth")?;
    let status = columns.optional("Status Code");
    let indexability = columns.optional("Indexability");
    let title = columns.optional("Title 1");
    let h1 = columns.optional("H1-1");

    let mut pages = Vec::new();
    let mut filtered = 0usize;
    for record in csv_reader.records() {
        let record = record?;
        if cell(&record, address).is_empty() {
            filtered += 1;
            continue;
        }
        if let Some(idx) = status {
            if coerce_number(cell(&record, idx)) != 200.0 {
                filtered += 1;
                continue;
            }
        }
        if let Some(idx) = indexability {
            if cell(&record, idx) != "Indexable" {
                filtered += 1;
                continue;
            }
        }

        let mut page = Page::new(cell(&record, address))
            .with_link_score(coerce_number(cell(&record, link_score)))
            .with_unique_inlinks(coerce_number(cell(&record, inlinks)))
            .with_crawl_depth(coerce_number(cell(&record, depth)));
        page.title = optional_cell(&record, title);
        page.h1 = optional_cell(&record, h1);
        pages.push(page);
    }

    info!(kept = pages.len(), filtered = filtered, "Crawl table loaded");
    Ok(pages)
}

pub fn read_search_performance<R: Read>(reader: R) -> Result<Vec<SearchRow>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::new(SEARCH_TABLE, csv_reader.headers()?);

    let page = columns.require("Page")?;
    let clicks = columns.require("Clicks")?;
    let impressions = columns.require("Impressions")?;
    let position = columns.require("Position")?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(SearchRow {
            page: cell(&record, page).to_string(),
            clicks: coerce_number(cell(&record, clicks)),
            impressions: coerce_number(cell(&record, impressions)),
            position: coerce_number(cell(&record, position)),
        });
    }

    info!(rows = rows.len(), "Search performance table loaded");
    Ok(rows)
}

pub fn read_inlinks<R: Read>(reader: R) -> Result<Vec<LinkEdge>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = Columns::new(INLINKS_TABLE, csv_reader.headers()?);

    let source = columns.require("Source")?;
    let destination = columns.require("Destination")?;
    let anchor = columns.optional("Anchor");

    let mut edges = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut edge = LinkEdge::new(cell(&record, source), cell(&record, destination));
        edge.anchor = optional_cell(&record, anchor);
        edges.push(edge);
    }

    info!(rows = edges.len(), "Inlinks table loaded");
    Ok(edges)
}

/// Left-joins search rows onto pages by address, first search row wins
///
/// Pages without a search row get 0 impressions, 0 clicks and position 100.
pub fn merge_search(pages: Vec<Page>, rows: &[SearchRow]) -> Vec<Page> {
    let mut by_page: HashMap<&str, &SearchRow> = HashMap::with_capacity(rows.len());
    for row in rows {
        by_page.entry(row.page.as_str()).or_insert(row);
    }

    let mut unmatched = 0usize;
    let merged: Vec<Page> = pages
        .into_iter()
        .map(|page| match by_page.get(page.address.as_str()) {
            Some(row) => page
                .with_clicks(row.clicks)
                .with_impressions(row.impressions)
                .with_position(row.position),
            None => {
                unmatched += 1;
                page.with_clicks(0.0).with_impressions(0.0).with_position(100.0)
            }
        })
        .collect();

    if unmatched > 0 {
        info!(unmatched = unmatched, "Pages without search performance data");
    }
    merged
}

fn open(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Builder that locates the export files and produces the engine input
#[derive(Debug, Default, Clone)]
pub struct DatasetLoader {
    crawl: Option<PathBuf>,
    search: Option<PathBuf>,
    inlinks: Option<PathBuf>,
    normalize_addresses: bool,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn crawl(mut self, path: impl Into<PathBuf>) -> Self {
        self.crawl = Some(path.into());
        self
    }

    pub fn search(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.search = path.map(Into::into);
        self
    }

    pub fn inlinks(mut self, path: Option<impl Into<PathBuf>>) -> Self {
        self.inlinks = path.map(Into::into);
        self
    }

    pub fn normalize_addresses(mut self, enabled: bool) -> Self {
        self.normalize_addresses = enabled;
        self
    }

    pub fn load(&self) -> Result<AnalysisInput, IngestError> {
        let crawl_path = self.crawl.as_deref().ok_or(SchemaError::MissingPageTable)?;
        let mut pages = read_crawl(open(crawl_path)?)?;

        let mut search = match &self.search {
            Some(path) => read_search_performance(open(path)?)?,
            None => {
                warn!("No search performance file; all pages get default search metrics");
                Vec::new()
            }
        };

        let mut edges = match &self.inlinks {
            Some(path) => Some(read_inlinks(open(path)?)?),
            None => None,
        };

        if self.normalize_addresses {
            pages
                .iter_mut()
                .for_each(|p| p.address = normalize_address(&p.address));
            search
                .iter_mut()
                .for_each(|r| r.page = normalize_address(&r.page));
            if let Some(edges) = edges.as_mut() {
                for edge in edges.iter_mut() {
                    edge.source = normalize_address(&edge.source);
                    edge.destination = normalize_address(&edge.destination);
                }
            }
        }

        let pages = merge_search(pages, &search);
        Ok(AnalysisInput::builder()
            .pages(pages)
            .maybe_edges(edges)
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number("42"), 42.0);
        assert_eq!(coerce_number(" 1,234.5 "), 1234.5);
        assert_eq!(coerce_number("3.5%"), 3.5);
        assert!(coerce_number("n/a").is_nan());
        assert!(coerce_number("").is_nan());
    }

    #[test]
    fn test_crawl_filters_and_trims_headers() {
        let csv = "Address , Status Code,Indexability,Link Score,Unique Inlinks,Crawl Depth,Title 1\n\
                   /a,200,Indexable,40,3,1,Alpha\n\
                   /b,404,Indexable,40,3,1,\n\
                   /c,200,Non-Indexable,40,3,1,\n\
                   /d,200,Indexable,bad,2,2,\n";
        let pages = read_crawl(csv.as_bytes()).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].address, "/a");
        assert_eq!(pages[0].title.as_deref(), Some("Alpha"));
        assert!(pages[1].link_score.is_nan());
        assert!(pages[1].title.is_none());
    }

    #[test]
    fn test_crawl_skips_blank_addresses() {
        let csv = "Address,Link Score,Unique Inlinks,Crawl Depth\n/a,10,1,1\n  ,20,1,1\n/b,30,1,1\n";
        let pages = read_crawl(csv.as_bytes()).unwrap();
        let addresses: Vec<&str> = pages.iter().map(|p| p.address.as_str()).collect();
        assert_eq!(addresses, vec!["/a", "/b"]);
    }

    #[test]
    fn test_crawl_missing_column() {
        let csv = "Address,Link Score,Crawl Depth\n/a,1,1\n";
        match read_crawl(csv.as_bytes()) {
            Err(IngestError::Schema(SchemaError::MissingColumn { column, .. })) => {
                assert_eq!(column, "Unique Inlinks")
            }
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_keeps_first_search_row() {
        let pages = vec![Page::new("/a"), Page::new("/b")];
        let rows = vec![
            SearchRow {
                page: "/a".into(),
                clicks: 5.0,
                impressions: 100.0,
                position: 4.0,
            },
            SearchRow {
                page: "/a".into(),
                clicks: 9.0,
                impressions: 900.0,
                position: 40.0,
            },
        ];
        let merged = merge_search(pages, &rows);
        assert_eq!(merged[0].impressions, 100.0);
        assert_eq!(merged[0].position, 4.0);
        assert_eq!(merged[1].impressions, 0.0);
        assert_eq!(merged[1].position, 100.0);
    }

    #[test]
    fn test_read_inlinks_with_anchor() {
        let csv = "Source,Destination,Anchor\n/a,/b,shoes\n/a,/c,\n";
        let edges = read_inlinks(csv.as_bytes()).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].anchor.as_deref(), Some("shoes"));
        assert!(edges[1].anchor.is_none());
    }

    #[test]
    fn test_loader_requires_crawl() {
        match DatasetLoader::new().load() {
            Err(IngestError::Schema(SchemaError::MissingPageTable)) => {}
            other => panic!("expected missing page table, got {:?}", other),
        }
    }
}
