// * Report Export
// * Writes priority and opportunity tables as CSV and statistics as JSON

use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::engine::{AnalysisReport, OpportunityTable, PriorityTable, Statistics};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub const PRIORITY_FILE: &str = "priority.csv";
pub const OPPORTUNITIES_FILE: &str = "opportunities.csv";
pub const STATISTICS_FILE: &str = "statistics.json";

const PRIORITY_HEADERS: [&str; 13] = [
    "address",
    "impressions",
    "clicks",
    "position",
    "link_score",
    "crawl_depth",
    "unique_inlinks",
    "norm_impressions",
    "norm_position",
    "norm_link_score",
    "norm_depth",
    "priority_score",
    "has_potential",
];

const OPPORTUNITY_HEADERS: [&str; 14] = [
    "source",
    "target",
    "source_link_score",
    "target_link_score",
    "target_priority_score",
    "similarity",
    "source_outlinks",
    "target_inlinks",
    "target_impressions",
    "target_position",
    "source_strength",
    "outlinks_penalty",
    "target_need",
    "opportunity_score",
];

// * Flat CSV row for one scored page
#[derive(Debug, Serialize)]
struct PriorityRecord<'a> {
    address: &'a str,
    impressions: f64,
    clicks: f64,
    position: f64,
    link_score: f64,
    crawl_depth: f64,
    unique_inlinks: f64,
    norm_impressions: f64,
    norm_position: f64,
    norm_link_score: f64,
    norm_depth: f64,
    priority_score: f64,
    has_potential: bool,
}

/// Writes the priority table; an empty table still gets its header row
pub fn write_priority_csv<W: Write>(writer: W, table: &PriorityTable) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(PRIORITY_HEADERS)?;
    for row in table.iter() {
        csv_writer.serialize(PriorityRecord {
            address: row.address(),
            impressions: row.page.impressions,
            clicks: row.page.clicks,
            position: row.page.position,
            link_score: row.page.link_score,
            crawl_depth: row.page.crawl_depth,
            unique_inlinks: row.page.unique_inlinks,
            norm_impressions: row.norm_impressions,
            norm_position: row.norm_position,
            norm_link_score: row.norm_link_score,
            norm_depth: row.norm_depth,
            priority_score: row.priority_score,
            has_potential: row.has_potential,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes opportunities; an empty table still gets its header row
pub fn write_opportunities_csv<W: Write>(
    writer: W,
    table: &OpportunityTable,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(OPPORTUNITY_HEADERS)?;
    for row in table.iter() {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_statistics_json<W: Write>(
    writer: W,
    statistics: &Statistics,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, statistics)?;
    Ok(())
}

/// Writes all report files into `dir`, creating it if needed
pub fn export_report(dir: &Path, report: &AnalysisReport) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir)?;

    let priority_path = dir.join(PRIORITY_FILE);
    write_priority_csv(File::create(&priority_path)?, &report.priority)?;

    let opportunities_path = dir.join(OPPORTUNITIES_FILE);
    write_opportunities_csv(File::create(&opportunities_path)?, &report.opportunities)?;

    let statistics_path = dir.join(STATISTICS_FILE);
    write_statistics_json(File::create(&statistics_path)?, &report.statistics)?;

    info!(
        dir = %dir.display(),
        priority_rows = report.priority.len(),
        opportunities = report.opportunities.len(),
        "Report exported"
    );
    Ok(vec![priority_path, opportunities_path, statistics_path])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_opportunities_write_header_only() {
        let mut buffer = Vec::new();
        write_opportunities_csv(&mut buffer, &OpportunityTable::default()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("source,target,"));
        assert!(text.trim_end().ends_with("opportunity_score"));
    }

    #[test]
    fn test_empty_priority_table_writes_header_only() {
        let mut buffer = Vec::new();
        write_priority_csv(&mut buffer, &PriorityTable::default()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert_eq!(text.trim_end(), PRIORITY_HEADERS.join(","));
    }

    #[test]
    fn test_priority_rows_follow_header() {
        let pages = crate::persistence::schema::PageSet::new(vec![
            crate::persistence::schema::Page::new("/a").with_impressions(10.0),
            crate::persistence::schema::Page::new("/b"),
        ])
        .unwrap();
        let table = crate::engine::PriorityScorer::new(Default::default(), 10.0).score(&pages);
        let mut buffer = Vec::new();
        write_priority_csv(&mut buffer, &table).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("address,impressions,"));
        assert!(lines[1].starts_with("/a,10.0,"));
    }

    #[test]
    fn test_statistics_json_omits_missing_edges() {
        let stats = crate::engine::compute_statistics(&Default::default(), None);
        let mut buffer = Vec::new();
        write_statistics_json(&mut buffer, &stats).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["total_pages"], 0);
        assert!(value.get("total_internal_links").is_none());
    }
}
