//! The upload error taxonomy.
//!
//! Every variant is terminal for the upload: the core never retries. Display
//! strings are the operator-facing messages the upload boundary returns
//! verbatim; `Validation` additionally carries the complete per-row list.

use cld_schemas::RowError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    /// File extension is not one of csv / xlsx / xls. Refused before any
    /// parsing is attempted.
    #[error("Only CSV, XLSX, and XLS files are allowed")]
    UnsupportedFormat { extension: String },

    /// File exceeds the upload size limit. Refused before decode.
    #[error("File exceeds the {limit_bytes} byte upload limit")]
    TooLarge { size_bytes: u64, limit_bytes: u64 },

    /// Structurally corrupt input for the declared format. No partial row
    /// sequence is ever produced on this path. The underlying cause is kept
    /// for logs; the display string is what the operator sees.
    #[error("Error parsing file. Please check file format.")]
    Parse(anyhow::Error),

    /// Zero decodable rows.
    #[error("File is empty or invalid")]
    EmptyFile,

    /// One or more row-level rule violations. The whole batch is rejected;
    /// the list is complete (validation never stops at the first error).
    #[error("Data validation failed")]
    Validation(Vec<RowError>),

    /// No active agents at partition time.
    #[error("No active agents found. Please add agents first.")]
    NoEligibleAgents,

    /// Storage write failure during persistence. The batch was rolled back
    /// unless the wrapped cause says otherwise.
    #[error("Server error during file processing")]
    Persistence(anyhow::Error),
}

impl UploadError {
    /// Row errors carried by a `Validation` failure, if any.
    pub fn row_errors(&self) -> Option<&[RowError]> {
        match self {
            UploadError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_messages_match_upload_boundary_wording() {
        let err = UploadError::UnsupportedFormat {
            extension: "pdf".to_string(),
        };
        assert_eq!(err.to_string(), "Only CSV, XLSX, and XLS files are allowed");

        assert_eq!(
            UploadError::EmptyFile.to_string(),
            "File is empty or invalid"
        );
        assert_eq!(
            UploadError::Validation(vec![]).to_string(),
            "Data validation failed"
        );
        assert_eq!(
            UploadError::NoEligibleAgents.to_string(),
            "No active agents found. Please add agents first."
        );
    }

    #[test]
    fn row_errors_accessor() {
        let err = UploadError::Validation(vec![RowError::new(2, "Phone is required")]);
        let rows = err.row_errors().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].to_string(), "Row 2: Phone is required");

        assert!(UploadError::EmptyFile.row_errors().is_none());
    }
}
