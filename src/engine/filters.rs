// * Report Filters
// * Order-preserving views over the priority and opportunity tables

use serde::{Deserialize, Serialize};

use crate::engine::opportunity::{Opportunity, OpportunityTable};
use crate::engine::priority::ScoredPage;

/// Priority table filter; unset bounds accept everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityFilter {
    pub min_impressions: Option<f64>,
    pub max_position: Option<f64>,
    pub potential_only: bool,
}

impl PriorityFilter {
    pub fn matches(&self, row: &ScoredPage) -> bool {
        self.min_impressions.map_or(true, |min| row.page.impressions >= min)
            && self.max_position.map_or(true, |max| row.page.position <= max)
            && (!self.potential_only || row.has_potential)
    }

    pub fn apply<'a>(&self, rows: &'a [ScoredPage]) -> Vec<&'a ScoredPage> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }
}

/// Opportunity table filter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityFilter {
    pub min_similarity: Option<f64>,
    pub min_source_link_score: Option<f64>,
}

impl OpportunityFilter {
    pub fn matches(&self, row: &Opportunity) -> bool {
        self.min_similarity.map_or(true, |min| row.similarity >= min)
            && self
                .min_source_link_score
                .map_or(true, |min| row.source_link_score >= min)
    }

    /// Filtered copy; relative order of kept rows is unchanged
    pub fn apply(&self, table: &OpportunityTable) -> OpportunityTable {
        OpportunityTable::new(table.iter().filter(|o| self.matches(o)).cloned().collect())
    }
}
