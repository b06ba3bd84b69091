use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::SignatureArtifact;
use crate::{Result, SigilError};

/// Number of attendance rows on one sheet.
pub const SHEET_ROWS: usize = 16;

pub const MAX_DATE_LEN: usize = 10;
pub const MAX_TIME_LEN: usize = 10;
pub const MAX_MEETING_NAME_LEN: usize = 120;
pub const MAX_LOCATION_LEN: usize = 200;
pub const MAX_IMPACT_LEN: usize = 300;

/// Zero-based row index, rendered as `row-N` in persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(pub u8);

impl RowId {
    pub fn new(index: u8) -> Result<Self> {
        if (index as usize) < SHEET_ROWS {
            Ok(Self(index))
        } else {
            Err(SigilError::Session(format!(
                "row index {index} out of range (sheet has {SHEET_ROWS} rows)"
            )))
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{}", self.0)
    }
}

/// Editable text fields of an attendance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowField {
    Date,
    Time,
    MeetingName,
    Location,
    Impact,
}

impl RowField {
    pub fn max_len(self) -> usize {
        match self {
            RowField::Date => MAX_DATE_LEN,
            RowField::Time => MAX_TIME_LEN,
            RowField::MeetingName => MAX_MEETING_NAME_LEN,
            RowField::Location => MAX_LOCATION_LEN,
            RowField::Impact => MAX_IMPACT_LEN,
        }
    }
}

/// One meeting entry: when, where, which meeting, how it landed, and the
/// chair's signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRow {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub meeting_name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub signature: Option<SignatureArtifact>,
}

impl AttendanceRow {
    pub fn set_field(&mut self, field: RowField, value: impl Into<String>) {
        let slot = match field {
            RowField::Date => &mut self.date,
            RowField::Time => &mut self.time,
            RowField::MeetingName => &mut self.meeting_name,
            RowField::Location => &mut self.location,
            RowField::Impact => &mut self.impact,
        };
        *slot = truncate_chars(value.into(), field.max_len());
    }

    pub fn field(&self, field: RowField) -> &str {
        match field {
            RowField::Date => &self.date,
            RowField::Time => &self.time,
            RowField::MeetingName => &self.meeting_name,
            RowField::Location => &self.location,
            RowField::Impact => &self.impact,
        }
    }

    /// Clamp over-length fields, e.g. on documents written by older clients.
    pub fn sanitize(&mut self) {
        for field in [
            RowField::Date,
            RowField::Time,
            RowField::MeetingName,
            RowField::Location,
            RowField::Impact,
        ] {
            let value = self.field(field).to_string();
            self.set_field(field, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_empty()
            && self.time.is_empty()
            && self.meeting_name.is_empty()
            && self.location.is_empty()
            && self.impact.is_empty()
            && self.signature.is_none()
    }
}

/// A full 16-row attendance sheet for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceSheet {
    pub rows: Vec<AttendanceRow>,
}

impl Default for AttendanceSheet {
    fn default() -> Self {
        Self {
            rows: vec![AttendanceRow::default(); SHEET_ROWS],
        }
    }
}

impl AttendanceSheet {
    /// Normalize a loaded sheet to exactly [`SHEET_ROWS`] sanitized rows.
    pub fn normalize(&mut self) {
        self.rows.truncate(SHEET_ROWS);
        self.rows.resize_with(SHEET_ROWS, AttendanceRow::default);
        for row in &mut self.rows {
            row.sanitize();
        }
    }

    pub fn row(&self, id: RowId) -> &AttendanceRow {
        &self.rows[id.index()]
    }

    pub fn row_mut(&mut self, id: RowId) -> &mut AttendanceRow {
        &mut self.rows[id.index()]
    }
}

fn truncate_chars(value: String, max: usize) -> String {
    if value.chars().count() <= max {
        value
    } else {
        value.chars().take(max).collect()
    }
}
