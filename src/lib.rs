// * Interlink
// * Internal-link opportunity scoring over a crawl and search-performance snapshot

pub mod config;
pub mod engine;
pub mod ops;
pub mod persistence;

pub use config::{ConfigError, EngineConfig};
pub use engine::{AnalysisReport, Analyzer, EngineError};
pub use persistence::{AnalysisInput, DatasetLoader, LinkEdge, Page};
