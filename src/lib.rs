//! Pharmacy license roster extraction using lopdf
//!
//! This crate provides:
//! - Positioned text extraction from the published roster PDF
//! - Column-map based grouping of tokens into license records
//! - Field mapping with ISO date normalization and address decomposition
//! - A download → parse → CSV pipeline with date-stamped archival naming

pub mod address;
pub mod extractor;
pub mod grouper;
pub mod layout;
pub mod mapper;
pub mod pipeline;

pub use address::{decompose_address, AddressParts};
pub use extractor::{page_tokens, PositionedToken};
pub use grouper::{group_rows, RawRecordRow};
pub use layout::{ColumnMap, Field, RosterLayout};
pub use mapper::{map_row, normalize_date, PharmacyRecord};
pub use pipeline::{extract_records, extract_records_mem, run, RunSummary, ROSTER_URL};

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parsing error: {0}")]
    Pdf(String),
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("no extractable text in document")]
    NoText,
    #[error("malformed license number: {0:?}")]
    MalformedLicense(String),
}

impl From<lopdf::Error> for RosterError {
    fn from(e: lopdf::Error) -> Self {
        RosterError::Pdf(e.to_string())
    }
}
