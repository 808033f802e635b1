// * Persistence
// * Typed input schema, CSV ingestion, address normalization and report export

pub mod address;
pub mod export;
pub mod ingest;
pub mod schema;

pub use address::normalize_address;
pub use export::{export_report, ExportError};
pub use ingest::{DatasetLoader, IngestError, SearchRow};
pub use schema::{
    AnalysisInput, AnalysisInputBuilder, EdgeSet, LinkEdge, Page, PageSet, SchemaError,
};
