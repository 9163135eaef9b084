//! Schema normalizer. Maps the sheet's loosely-spelled header row onto
//! canonical field names via a fixed alias table.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::record::LeadRecord;

// ── Canonical field names ───────────────────────────────────────────

pub const COMPANY: &str = "COMPANY";
pub const CONTACT_PERSON: &str = "CONTACT_PERSON";
pub const CONTACT_DESIGNATION: &str = "CONTACT_DESIGNATION";
pub const CONTACT_NUMBER: &str = "CONTACT_NUMBER";
pub const CONTACT_EMAIL: &str = "CONTACT_EMAIL";
pub const LOCATION: &str = "LOCATION";
pub const INDUSTRY: &str = "INDUSTRY";
pub const STATUS: &str = "STATUS";
pub const ACTION: &str = "ACTION";
pub const REMARKS: &str = "REMARKS";
pub const FOLLOW_UP_DATE: &str = "FOLLOW_UP_DATE";
pub const RETRY_COUNT: &str = "RETRY_COUNT";

/// Fields a run cannot proceed without.
pub const REQUIRED_FIELDS: [&str; 2] = [STATUS, CONTACT_EMAIL];

/// Canonical field → accepted literal header spellings.
///
/// The canonical name itself always matches (case-insensitively), so an
/// already-standardized sheet normalizes to itself.
const ALIAS_TABLE: &[(&str, &[&str])] = &[
    (COMPANY, &["Company", "Name of the Exporter", "Business Name"]),
    (
        CONTACT_PERSON,
        &["Contact Person", "Name of the person", "Contact Name"],
    ),
    (
        CONTACT_DESIGNATION,
        &["Contact Person Designation", "Designation", "Title"],
    ),
    (CONTACT_NUMBER, &["Contact Number", "Phone", "Mobile"]),
    (CONTACT_EMAIL, &["Contact Email", "E-Mail", "Email"]),
    (LOCATION, &["Location", "Base Location", "City"]),
    (INDUSTRY, &["Industry", "Category", "Business Type"]),
    (STATUS, &["Status"]),
    (ACTION, &["Action"]),
    (REMARKS, &["Remarks", "Notes"]),
    (FOLLOW_UP_DATE, &["Follow Up Date", "Next Follow Up"]),
    (RETRY_COUNT, &["Retry Count", "Retries"]),
];

/// Resolve a raw header to its canonical field name, if the alias table
/// knows it.
pub fn canonicalize(header: &str) -> Option<&'static str> {
    let header = header.trim();
    ALIAS_TABLE.iter().find_map(|(canonical, aliases)| {
        let known = header.eq_ignore_ascii_case(canonical)
            || aliases.iter().any(|a| header.eq_ignore_ascii_case(a));
        known.then_some(*canonical)
    })
}

// ── Column schema ───────────────────────────────────────────────────

/// The sheet's header row, normalized. Built once per store snapshot.
///
/// Unmatched headers pass through unchanged; they are kept addressable, never
/// silently dropped. The sheet's schema stays authoritative over which fields
/// can be persisted.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl ColumnSchema {
    /// Normalize a raw header row.
    ///
    /// Fails only when a required field (STATUS, CONTACT_EMAIL) cannot be
    /// resolved from any header in the sheet.
    pub fn from_headers(headers: &[String]) -> Result<Self, SchemaError> {
        if headers.is_empty() {
            return Err(SchemaError::EmptyHeader);
        }

        let columns: Vec<String> = headers
            .iter()
            .map(|h| {
                canonicalize(h)
                    .map(str::to_string)
                    .unwrap_or_else(|| h.trim().to_string())
            })
            .collect();

        // First occurrence wins when a sheet carries duplicate headers.
        let mut index = HashMap::new();
        for (i, column) in columns.iter().enumerate() {
            index.entry(column.clone()).or_insert(i);
        }

        for required in REQUIRED_FIELDS {
            if !index.contains_key(required) {
                return Err(SchemaError::MissingRequiredColumn {
                    column: required.to_string(),
                });
            }
        }

        Ok(Self { columns, index })
    }

    /// Normalized header sequence, in sheet order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Zero-based column position of a canonical field, if the sheet has it.
    pub fn position(&self, field: &str) -> Option<usize> {
        self.index.get(field).copied()
    }

    /// Cell value for a field in a raw row. Short rows read as empty
    /// trailing cells.
    pub fn cell<'a>(&self, row: &'a [String], field: &str) -> &'a str {
        self.position(field)
            .and_then(|i| row.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Build a canonical record from a raw data row.
    pub fn record_from_row(&self, row: &[String]) -> LeadRecord {
        let mut fields = HashMap::new();
        for (i, column) in self.columns.iter().enumerate() {
            let value = row.get(i).cloned().unwrap_or_default();
            fields.entry(column.clone()).or_insert(value);
        }
        LeadRecord::from_fields(&fields)
    }

    /// Project canonical field values onto the sheet's current header order,
    /// filling unknown fields with empty strings.
    pub fn project(&self, fields: &HashMap<String, String>) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| fields.get(column).cloned().unwrap_or_default())
            .collect()
    }
}
