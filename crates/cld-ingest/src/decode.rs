// crates/cld-ingest/src/decode.rs
//
// Uploaded-file decoding: comma-delimited text and spreadsheet binaries into
// an ordered sequence of loosely-typed rows. Decoding is all-or-nothing at
// the file level: a structurally corrupt file yields Parse with no partial
// row sequence.

use std::io::Cursor;

use anyhow::anyhow;
use calamine::Reader;

use crate::error::UploadError;

/// Tabular formats accepted at the upload boundary. Dispatch happens on this
/// tag, derived from the file extension, never by sniffing at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Map a file extension (without the dot, any casing) to a format tag.
    /// Anything unrecognized is refused before parsing is attempted.
    pub fn from_extension(extension: &str) -> Result<Self, UploadError> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "xls" => Ok(FileFormat::Xls),
            other => Err(UploadError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

/// One decoded row: `(header, value)` pairs in column order, header casing
/// preserved exactly as found in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.fields.push((header.into(), value.into()));
    }

    /// Case-insensitive field lookup. An empty value under one casing does
    /// not shadow a populated value under another, so `FirstName=""` next to
    /// `firstname="Ana"` still resolves.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(header, value)| header.eq_ignore_ascii_case(name) && !value.is_empty())
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }
}

/// Decode an uploaded byte stream into rows for the declared format.
pub fn decode_rows(bytes: &[u8], format: FileFormat) -> Result<Vec<RawRow>, UploadError> {
    match format {
        FileFormat::Csv => decode_csv(bytes),
        FileFormat::Xlsx | FileFormat::Xls => decode_workbook(bytes),
    }
}

/// First record is the header row; the rest stream into RawRows. The reader
/// is strict: ragged records and invalid UTF-8 fail the whole decode.
fn decode_csv(bytes: &[u8]) -> Result<Vec<RawRow>, UploadError> {
    let mut rdr = csv::Reader::from_reader(bytes);

    let headers = rdr
        .headers()
        .map_err(|e| UploadError::Parse(anyhow::Error::new(e)))?
        .clone();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| UploadError::Parse(anyhow::Error::new(e)))?;
        let mut row = RawRow::default();
        for (i, header) in headers.iter().enumerate() {
            row.push(header, record.get(i).unwrap_or(""));
        }
        rows.push(row);
    }

    Ok(rows)
}

/// First sheet only, by file-internal order. The sheet's first row supplies
/// the headers; cells are stringified; columns with an empty header are
/// skipped.
fn decode_workbook(bytes: &[u8]) -> Result<Vec<RawRow>, UploadError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| UploadError::Parse(anyhow::Error::new(e)))?;

    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| UploadError::Parse(anyhow!("workbook has no sheets")))?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| UploadError::Parse(anyhow::Error::new(e)))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header_row) => header_row.iter().map(|cell| cell.to_string()).collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for sheet_row in sheet_rows {
        let mut row = RawRow::default();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = sheet_row.get(i).map(|cell| cell.to_string()).unwrap_or_default();
            row.push(header.clone(), value);
        }
        rows.push(row);
    }

    Ok(rows)
}
