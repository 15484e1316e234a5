//! Grouping of positioned tokens into logical license records
//!
//! The roster prints one record per visual line, with names, DBAs, and
//! addresses overflowing onto continuation lines that leave the license-number
//! column blank. Grouping clusters tokens into visual lines by vertical
//! position, opens a new row exactly when the license-number band yields
//! all-digit text, and folds continuation lines into the open row.

use std::collections::BTreeMap;

use crate::layout::{Field, RosterLayout};
use crate::PositionedToken;

/// One logical record row: concatenated text per column band.
///
/// Sealed by [`RowBuilder::finish`]; every row is guaranteed a non-empty
/// license-number value by construction.
#[derive(Debug, Clone)]
pub struct RawRecordRow {
    values: BTreeMap<Field, String>,
}

impl RawRecordRow {
    /// Concatenated text for `field`, empty if no token landed in its band.
    pub fn get(&self, field: Field) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }
}

/// Accumulates band text for one record until the next record starts.
struct RowBuilder {
    values: BTreeMap<Field, String>,
}

impl RowBuilder {
    fn new() -> Self {
        RowBuilder {
            values: BTreeMap::new(),
        }
    }

    fn push(&mut self, field: Field, text: &str) {
        let slot = self.values.entry(field).or_default();
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(text);
    }

    fn finish(self) -> RawRecordRow {
        RawRecordRow {
            values: self.values,
        }
    }
}

/// Group one page's tokens into record rows.
///
/// Tokens are expected in reading order for a single page, already filtered
/// past the header cutoff. Lines seen before the first license number are
/// discarded as residual header/footer noise. A page without any license
/// number yields an empty vector; callers decide how to report that.
pub fn group_rows(tokens: &[PositionedToken], layout: &RosterLayout) -> Vec<RawRecordRow> {
    let mut sorted: Vec<&PositionedToken> = tokens.iter().collect();
    sorted.sort_by(|a, b| {
        (a.top, a.x)
            .partial_cmp(&(b.top, b.x))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Cluster into visual lines by top position
    let mut lines: Vec<Vec<&PositionedToken>> = Vec::new();
    let mut line_top = f32::NEG_INFINITY;
    for token in sorted {
        match lines.last_mut() {
            Some(line) if (token.top - line_top).abs() < layout.y_tolerance => {
                line.push(token);
            }
            _ => {
                line_top = token.top;
                lines.push(vec![token]);
            }
        }
    }

    // Left-to-right within each line, regardless of stream order
    for line in &mut lines {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    }

    let mut rows = Vec::new();
    let mut builder: Option<RowBuilder> = None;

    for line in lines {
        if line_starts_record(&line, layout) {
            if let Some(done) = builder.take() {
                rows.push(done.finish());
            }
            builder = Some(RowBuilder::new());
        }

        let Some(current) = builder.as_mut() else {
            // Header/footer noise before the first record
            continue;
        };

        for token in line {
            match layout.columns.field_at(token.x) {
                Some(field) => current.push(field, token.text.trim()),
                None => {
                    log::debug!(
                        "token outside column bands at x={:.1}: {:?}",
                        token.x,
                        token.text
                    );
                }
            }
        }
    }

    if let Some(done) = builder.take() {
        rows.push(done.finish());
    }

    rows
}

/// A line starts a record when its license-number band holds all-digit text.
fn line_starts_record(line: &[&PositionedToken], layout: &RosterLayout) -> bool {
    line.iter().any(|token| {
        layout.columns.field_at(token.x) == Some(Field::LicenseNo)
            && !token.text.trim().is_empty()
            && token.text.trim().chars().all(|c| c.is_ascii_digit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str, x: f32, top: f32) -> PositionedToken {
        PositionedToken {
            text: text.to_string(),
            x,
            top,
            page: 1,
        }
    }

    #[test]
    fn test_single_line_record() {
        let layout = RosterLayout::default();
        let tokens = vec![
            tok("1234", 20.0, 200.0),
            tok("Pharmacy", 100.0, 200.0),
            tok("ACME DRUG LLC", 260.0, 200.0),
            tok("500 MAIN ST OMAHA NE 68102", 500.0, 200.0),
        ];

        let rows = group_rows(&tokens, &layout);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Field::LicenseNo), "1234");
        assert_eq!(rows[0].get(Field::LicenseType), "Pharmacy");
        assert_eq!(rows[0].get(Field::Address), "500 MAIN ST OMAHA NE 68102");
        assert_eq!(rows[0].get(Field::Dba), "");
    }

    #[test]
    fn test_continuation_line_merges_into_previous_row() {
        let layout = RosterLayout::default();
        let tokens = vec![
            tok("1234", 20.0, 200.0),
            tok("ACME DRUG", 260.0, 200.0),
            tok("500 MAIN ST", 500.0, 200.0),
            // Continuation: no license number, extra name and address text
            tok("COMPANY LLC", 260.0, 212.0),
            tok("OMAHA NE 68102", 500.0, 212.0),
        ];

        let rows = group_rows(&tokens, &layout);
        assert_eq!(rows.len(), 1, "continuation must not open a second row");
        assert_eq!(rows[0].get(Field::LicenseeName), "ACME DRUG COMPANY LLC");
        assert_eq!(rows[0].get(Field::Address), "500 MAIN ST OMAHA NE 68102");
    }

    #[test]
    fn test_two_records_split_on_license_number() {
        let layout = RosterLayout::default();
        let tokens = vec![
            tok("1111", 20.0, 200.0),
            tok("FIRST RX", 260.0, 200.0),
            tok("2222", 20.0, 215.0),
            tok("SECOND RX", 260.0, 215.0),
        ];

        let rows = group_rows(&tokens, &layout);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(Field::LicenseNo), "1111");
        assert_eq!(rows[1].get(Field::LicenseNo), "2222");
        assert_eq!(rows[1].get(Field::LicenseeName), "SECOND RX");
    }

    #[test]
    fn test_leading_noise_discarded() {
        let layout = RosterLayout::default();
        let tokens = vec![
            // Column headings land before any license number
            tok("License", 20.0, 140.0),
            tok("Name", 260.0, 140.0),
            tok("1234", 20.0, 200.0),
            tok("ACME DRUG", 260.0, 200.0),
        ];

        let rows = group_rows(&tokens, &layout);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Field::LicenseeName), "ACME DRUG");
    }

    #[test]
    fn test_non_digit_license_band_does_not_start_record() {
        let layout = RosterLayout::default();
        let tokens = vec![tok("License#", 20.0, 140.0), tok("Name", 260.0, 140.0)];
        assert!(group_rows(&tokens, &layout).is_empty());
    }

    #[test]
    fn test_page_without_license_numbers_yields_no_rows() {
        let layout = RosterLayout::default();
        let tokens = vec![
            tok("This page intentionally", 260.0, 300.0),
            tok("left blank", 260.0, 315.0),
        ];
        assert!(group_rows(&tokens, &layout).is_empty());
    }

    #[test]
    fn test_y_tolerance_boundary() {
        let layout = RosterLayout::default();

        // 2.9 below the anchor: same visual line, so x order wins
        let rows = group_rows(
            &[
                tok("1234", 20.0, 200.0),
                tok("ZULU", 300.0, 202.0),
                tok("ALPHA", 260.0, 202.9),
            ],
            &layout,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Field::LicenseeName), "ALPHA ZULU");

        // Exactly the tolerance apart: a new line, merged as continuation
        let rows = group_rows(
            &[
                tok("1234", 20.0, 200.0),
                tok("ZULU", 300.0, 200.5),
                tok("ALPHA", 260.0, 203.0),
            ],
            &layout,
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Field::LicenseeName), "ZULU ALPHA");
    }

    #[test]
    fn test_same_line_tokens_ordered_by_x() {
        let layout = RosterLayout::default();
        // Stream order has the name before the license number; x sort restores it
        let tokens = vec![
            tok("ACME DRUG", 260.0, 200.5),
            tok("1234", 20.0, 200.0),
            tok("LLC", 300.0, 200.2),
        ];

        let rows = group_rows(&tokens, &layout);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(Field::LicenseeName), "ACME DRUG LLC");
    }
}
