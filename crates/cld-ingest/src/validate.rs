// crates/cld-ingest/src/validate.rs
//
// Row validation. Accumulates every violation across every row, then decides
// once: either the full batch of CallRecords or the complete error list.

use std::sync::LazyLock;

use regex::Regex;

use cld_schemas::{CallRecord, RowError};

use crate::decode::RawRow;
use crate::error::UploadError;

/// Permissive phone pattern: digits, whitespace, `+` (leading only), `-`,
/// parentheses. Formatting is the operator's business; this only filters
/// out values that cannot be a phone number at all.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]+$").expect("phone pattern"));

const FIELD_FIRST_NAME: &str = "FirstName";
const FIELD_PHONE: &str = "Phone";
const FIELD_NOTES: &str = "Notes";

/// Validate decoded rows into CallRecords.
///
/// Zero rows is its own failure (`EmptyFile`), reported before any field
/// rule runs. Otherwise the scan visits every row and records all applicable
/// errors per row; success is binary at the batch level, so any error
/// discards the records and returns the full list.
pub fn validate_rows(rows: &[RawRow]) -> Result<Vec<CallRecord>, UploadError> {
    if rows.is_empty() {
        return Err(UploadError::EmptyFile);
    }

    let mut records = Vec::with_capacity(rows.len());
    let mut errors: Vec<RowError> = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;

        let first_name = row.get(FIELD_FIRST_NAME);
        let phone = row.get(FIELD_PHONE);

        if first_name.is_none() {
            errors.push(RowError::new(row_number, "FirstName is required"));
        }
        if phone.is_none() {
            errors.push(RowError::new(row_number, "Phone is required"));
        }
        if let Some(phone) = phone {
            if !PHONE_RE.is_match(phone) {
                errors.push(RowError::new(row_number, "Invalid phone number format"));
            }
        }

        if let (Some(first_name), Some(phone)) = (first_name, phone) {
            records.push(CallRecord {
                first_name: first_name.to_string(),
                phone: phone.to_string(),
                notes: row.get(FIELD_NOTES).unwrap_or_default().to_string(),
                original_index: index as i64,
            });
        }
    }

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(UploadError::Validation(errors))
    }
}
