//! Download → parse → CSV pipeline
//!
//! Single-threaded and single-pass: the download blocks until complete, pages
//! are parsed in document order, and the CSV is written after all records are
//! collected. Archived inputs and outputs carry an ISO date stamp in the
//! filename.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use lopdf::Document;

use crate::grouper::group_rows;
use crate::layout::RosterLayout;
use crate::mapper::{map_row, PharmacyRecord};
use crate::{extractor, RosterError};

/// Published roster location.
pub const ROSTER_URL: &str = "https://dhhs.ne.gov/licensure/Documents/CommunityPharmacyRoster.pdf";

/// CSV header, in output order.
const CSV_COLUMNS: [&str; 12] = [
    "license_no",
    "license_type",
    "licensee_name",
    "dba",
    "address",
    "street",
    "city",
    "state",
    "zip",
    "ssn_fein",
    "issue_date",
    "exp_date",
];

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    pub pages: usize,
    pub records: usize,
    /// Rows dropped for malformed license numbers.
    pub skipped_rows: usize,
    pub pdf_path: PathBuf,
    pub csv_path: PathBuf,
}

/// Download the roster PDF into `dir` with a date-stamped filename.
pub fn download_pdf(url: &str, dir: &Path) -> Result<PathBuf, RosterError> {
    fs::create_dir_all(dir)?;

    let today = Local::now().format("%Y-%m-%d");
    let path = dir.join(format!("CommunityPharmacyRoster_{today}.pdf"));

    log::info!("downloading roster: {url}");
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let body = response.bytes()?;
    fs::write(&path, &body)?;
    log::info!("saved {} bytes to {}", body.len(), path.display());

    Ok(path)
}

/// Extract all pharmacy records from a roster PDF on disk.
pub fn extract_records(path: &Path) -> Result<(Vec<PharmacyRecord>, usize), RosterError> {
    let doc = Document::load(path)?;
    extract_from_document(&doc, &RosterLayout::default())
}

/// Extract all pharmacy records from a roster PDF in memory.
pub fn extract_records_mem(buffer: &[u8]) -> Result<(Vec<PharmacyRecord>, usize), RosterError> {
    let doc = Document::load_mem(buffer)?;
    extract_from_document(&doc, &RosterLayout::default())
}

/// Page-ordered extraction, grouping, and mapping for one loaded document.
///
/// Returns the records plus the count of rows skipped for malformed license
/// numbers. Pages without any license number contribute zero rows and are
/// logged; a document with no extractable text at all is fatal.
pub fn extract_from_document(
    doc: &Document,
    layout: &RosterLayout,
) -> Result<(Vec<PharmacyRecord>, usize), RosterError> {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut total_tokens = 0usize;

    for (page_num, page_id) in doc.get_pages() {
        let tokens = extractor::page_tokens(doc, page_id, page_num)?;
        total_tokens += tokens.len();

        let cutoff = layout.header_cutoff(page_num);
        let content: Vec<_> = tokens
            .into_iter()
            .filter(|t| t.top >= cutoff)
            .collect();

        let rows = group_rows(&content, layout);
        if rows.is_empty() {
            log::warn!("page {page_num}: no license records found");
            continue;
        }

        for row in rows {
            match map_row(&row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    log::warn!("page {page_num}: skipping row: {e}");
                }
            }
        }
    }

    if total_tokens == 0 {
        return Err(RosterError::NoText);
    }

    Ok((records, skipped))
}

/// Write records to `path` in document order, creating parent directories.
pub fn write_csv(records: &[PharmacyRecord], path: &Path) -> Result<(), RosterError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_COLUMNS)?;
    for r in records {
        writer.write_record([
            &r.license_no,
            &r.license_type,
            &r.licensee_name,
            &r.dba,
            &r.address,
            &r.street,
            &r.city,
            &r.state,
            &r.zip,
            &r.ssn_fein,
            &r.issue_date,
            &r.exp_date,
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Full pipeline: download, parse, write a date-stamped CSV.
///
/// Zero extracted records is reported in the summary (and logged), not treated
/// as fatal; only a document with no extractable text aborts the run.
pub fn run(url: &str, pdf_dir: &Path, out_dir: &Path) -> Result<RunSummary, RosterError> {
    let pdf_path = download_pdf(url, pdf_dir)?;

    let doc = Document::load(&pdf_path)?;
    let pages = doc.get_pages().len();
    let (records, skipped_rows) = extract_from_document(&doc, &RosterLayout::default())?;

    if records.is_empty() {
        log::warn!("no records extracted from {}", pdf_path.display());
    }

    let today = Local::now().format("%Y-%m-%d");
    let csv_path = out_dir.join(format!("community_pharmacies_{today}.csv"));
    write_csv(&records, &csv_path)?;

    Ok(RunSummary {
        pages,
        records: records.len(),
        skipped_rows,
        pdf_path,
        csv_path,
    })
}
