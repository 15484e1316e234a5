//! Mapping of grouped record rows to structured pharmacy records
//!
//! Validates the license number, cleans the address band, scans the dates band
//! for issue/expiration dates, and decomposes the address into components.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::address::decompose_address;
use crate::layout::Field;
use crate::{RawRecordRow, RosterError};

/// Page-footer text that bleeds into the address band on the last record.
const FOOTER_MARKER: &str = "Total Licenses:";

/// Month/day/year with 2- or 4-digit year, slash or dash separated.
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").unwrap());

/// Source date formats, tried in order. ISO first keeps normalization
/// idempotent. The `%y` forms must precede the `%Y` ones: `%Y` accepts 1-4
/// digit years, so it would swallow "1/5/99" as year 99, while `%y` consumes
/// exactly two digits and rejects four-digit input as trailing text.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%y", "%m-%d-%y", "%m/%d/%Y", "%m-%d-%Y"];

/// One structured roster entry, ready for CSV serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PharmacyRecord {
    pub license_no: String,
    pub license_type: String,
    pub licensee_name: String,
    pub dba: String,
    pub address: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub ssn_fein: String,
    pub issue_date: String,
    pub exp_date: String,
}

/// Map a grouped row to a [`PharmacyRecord`].
///
/// Fails only on a missing or non-numeric license number; date and address
/// irregularities degrade to empty or best-effort fields.
pub fn map_row(row: &RawRecordRow) -> Result<PharmacyRecord, RosterError> {
    let license_no = row.get(Field::LicenseNo).trim().to_string();
    if license_no.is_empty() || !license_no.chars().all(|c| c.is_ascii_digit()) {
        return Err(RosterError::MalformedLicense(license_no));
    }

    let address = clean_address(row.get(Field::Address));

    // First date in the band is the issue date, second the expiration
    let dates_text = row.get(Field::Dates);
    let mut dates = DATE_RE.find_iter(dates_text);
    let issue_date = dates.next().map(|m| normalize_date(m.as_str())).unwrap_or_default();
    let exp_date = dates.next().map(|m| normalize_date(m.as_str())).unwrap_or_default();

    let parts = decompose_address(&address);

    Ok(PharmacyRecord {
        license_no,
        license_type: row.get(Field::LicenseType).trim().to_string(),
        licensee_name: row.get(Field::LicenseeName).trim().to_string(),
        dba: row.get(Field::Dba).trim().to_string(),
        address,
        street: parts.street,
        city: parts.city,
        state: parts.state,
        zip: parts.zip,
        ssn_fein: row.get(Field::SsnFein).trim().to_string(),
        issue_date,
        exp_date,
    })
}

/// Collapse whitespace and drop the page footer when it leaked into the band.
fn clean_address(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.find(FOOTER_MARKER) {
        Some(idx) => collapsed[..idx].trim().to_string(),
        None => collapsed,
    }
}

/// Normalize a source date string to `YYYY-MM-DD`.
///
/// Accepts month/day/year with 2- or 4-digit years, slash or dash separated,
/// plus ISO input (so normalizing twice is a no-op). Two-digit years follow
/// chrono's pivot: 00-68 map to 20xx, 69-99 to 19xx. Anything unparseable
/// becomes the empty string; dates are never fabricated.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    for format in DATE_FORMATS {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    log::debug!("unparseable date: {:?}", raw);
    String::new()
}
