//! Static page layout configuration for the roster PDF
//!
//! The roster has no real table structure; its columns are fixed x-coordinate
//! bands calibrated against the published document. The layout is an immutable
//! configuration struct passed into the grouper and pipeline, so alternate
//! layout versions can coexist without shared state.

/// The named columns of a roster page, in left-to-right order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    LicenseNo,
    LicenseType,
    LicenseeName,
    Dba,
    Address,
    SsnFein,
    Dates,
}

impl Field {
    /// Column name as it appears in the CSV output.
    pub fn name(&self) -> &'static str {
        match self {
            Field::LicenseNo => "license_no",
            Field::LicenseType => "license_type",
            Field::LicenseeName => "licensee_name",
            Field::Dba => "dba",
            Field::Address => "address",
            Field::SsnFein => "ssn_fein",
            Field::Dates => "dates",
        }
    }
}

/// Ordered mapping from field to a half-open x interval `[x_min, x_max)`.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    bands: Vec<(Field, f32, f32)>,
}

impl ColumnMap {
    pub fn new(bands: Vec<(Field, f32, f32)>) -> Self {
        ColumnMap { bands }
    }

    /// The field whose band contains `x`, if any.
    pub fn field_at(&self, x: f32) -> Option<Field> {
        self.bands
            .iter()
            .find(|(_, x_min, x_max)| *x_min <= x && x < *x_max)
            .map(|(field, _, _)| *field)
    }

    /// The `[x_min, x_max)` band for `field`, if mapped.
    pub fn band(&self, field: Field) -> Option<(f32, f32)> {
        self.bands
            .iter()
            .find(|(f, _, _)| *f == field)
            .map(|(_, x_min, x_max)| (*x_min, *x_max))
    }
}

/// Full layout description for one roster document version.
#[derive(Debug, Clone)]
pub struct RosterLayout {
    pub columns: ColumnMap,
    /// Tokens whose tops differ by less than this belong to the same visual line.
    pub y_tolerance: f32,
    /// Tokens above this top coordinate on page 1 are title/header noise.
    pub first_page_header: f32,
    /// Header cutoff for every later page (column headings only).
    pub other_page_header: f32,
}

impl RosterLayout {
    /// Layout of the community pharmacy roster as currently published.
    pub fn community_pharmacy() -> Self {
        RosterLayout {
            columns: ColumnMap::new(vec![
                (Field::LicenseNo, 0.0, 90.0),
                (Field::LicenseType, 90.0, 250.0),
                (Field::LicenseeName, 250.0, 375.0),
                (Field::Dba, 375.0, 495.0),
                (Field::Address, 495.0, 640.0),
                (Field::SsnFein, 640.0, 715.0),
                (Field::Dates, 715.0, 800.0),
            ]),
            y_tolerance: 3.0,
            first_page_header: 130.0,
            other_page_header: 50.0,
        }
    }

    /// Header cutoff for a given 1-indexed page number.
    pub fn header_cutoff(&self, page: u32) -> f32 {
        if page == 1 {
            self.first_page_header
        } else {
            self.other_page_header
        }
    }
}

impl Default for RosterLayout {
    fn default() -> Self {
        RosterLayout::community_pharmacy()
    }
}
