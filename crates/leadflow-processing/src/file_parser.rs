//! Import file validation
//!
//! The parser is an all-or-nothing gate: the header must match exactly, the data row
//! count must be within bounds, and a single invalid row rejects the whole upload with
//! the complete list of row errors.

use leadflow_core::models::{ParsedRow, RowError};
use leadflow_core::validation::{validate_cpf, validate_email, validate_phone};
use leadflow_core::AppError;

use crate::decode::{decode_table, FileFormat};

/// Header every import file must start with, compared case-insensitively
pub const EXPECTED_COLUMNS: [&str; 5] = ["name", "phone", "cpf", "email", "tags"];

pub const MAX_DATA_ROWS: usize = 5000;

const MAX_NAME_LENGTH: usize = 255;
const MAX_TAGS_LENGTH: usize = 255;
const MAX_TAGS_PER_ROW: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileParseError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to read file: {0}")]
    Decode(String),

    #[error("file is empty")]
    Empty,

    #[error("file must have exactly 5 columns (name, phone, cpf, email, tags), got {0}")]
    ColumnCount(usize),

    #[error("column {index} must be '{expected}', got '{got}'")]
    ColumnName {
        index: usize,
        expected: &'static str,
        got: String,
    },

    #[error("file must have at least 1 data row")]
    NoDataRows,

    #[error("file must have at most {max} data rows, got {got}")]
    TooManyRows { max: usize, got: usize },

    #[error("file contains invalid rows")]
    InvalidRows(Vec<RowError>),
}

impl From<FileParseError> for AppError {
    fn from(err: FileParseError) -> Self {
        match err {
            FileParseError::InvalidRows(errors) => AppError::InvalidRows(errors),
            other => AppError::FileValidation(other.to_string()),
        }
    }
}

/// Result of validating every data row, before the all-or-nothing policy is applied
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub rows: Vec<ParsedRow>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone)]
pub struct FileParser {
    max_rows: usize,
}

impl Default for FileParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FileParser {
    pub fn new() -> Self {
        Self {
            max_rows: MAX_DATA_ROWS,
        }
    }

    pub fn with_max_rows(max_rows: usize) -> Self {
        Self { max_rows }
    }

    /// Parse an upload and return its rows only if every one of them is valid.
    pub fn parse(&self, bytes: &[u8], file_name: &str) -> Result<Vec<ParsedRow>, FileParseError> {
        let parsed = self.parse_all(bytes, file_name)?;
        if !parsed.errors.is_empty() {
            tracing::debug!(
                file_name = %file_name,
                invalid_rows = parsed.errors.len(),
                "Rejecting import file with invalid rows"
            );
            return Err(FileParseError::InvalidRows(parsed.errors));
        }
        Ok(parsed.rows)
    }

    /// Structural checks plus per-row validation, collecting every row error.
    ///
    /// Structural failures (format, header, row count) abort before any row is examined.
    pub fn parse_all(&self, bytes: &[u8], file_name: &str) -> Result<ParsedFile, FileParseError> {
        let format = FileFormat::from_file_name(file_name)?;
        if bytes.is_empty() {
            return Err(FileParseError::Empty);
        }

        let table = decode_table(bytes, format)?;
        let (header, data) = match table.split_first() {
            Some(split) => split,
            None => return Err(FileParseError::Empty),
        };

        check_header(header)?;

        let data_rows = data.len();
        if data_rows == 0 {
            return Err(FileParseError::NoDataRows);
        }
        if data_rows > self.max_rows {
            return Err(FileParseError::TooManyRows {
                max: self.max_rows,
                got: data_rows,
            });
        }

        let mut parsed = ParsedFile::default();
        for (index, cells) in data.iter().enumerate() {
            match validate_row(cells, index + 2) {
                Ok(row) => parsed.rows.push(row),
                Err(error) => parsed.errors.push(error),
            }
        }

        tracing::debug!(
            file_name = %file_name,
            valid_rows = parsed.rows.len(),
            invalid_rows = parsed.errors.len(),
            "Parsed import file"
        );

        Ok(parsed)
    }
}

fn check_header(header: &[String]) -> Result<(), FileParseError> {
    if header.len() != EXPECTED_COLUMNS.len() {
        return Err(FileParseError::ColumnCount(header.len()));
    }

    for (index, (cell, expected)) in header.iter().zip(EXPECTED_COLUMNS).enumerate() {
        let got = cell.trim();
        if !got.eq_ignore_ascii_case(expected) {
            return Err(FileParseError::ColumnName {
                index: index + 1,
                expected,
                got: got.to_string(),
            });
        }
    }

    Ok(())
}

/// Validate one data row. Only the first failing column is reported.
fn validate_row(cells: &[String], row: usize) -> Result<ParsedRow, RowError> {
    let cell = |i: usize| cells.get(i).map(|c| c.trim()).unwrap_or("");
    let fail = |column: &str, message: String| RowError {
        row,
        column: column.to_string(),
        message,
    };

    let name = cell(0);
    if name.is_empty() {
        return Err(fail("name", "name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(fail(
            "name",
            format!("name must be at most {} characters", MAX_NAME_LENGTH),
        ));
    }

    let raw_phone = cell(1);
    if raw_phone.is_empty() {
        return Err(fail("phone", "phone is required".to_string()));
    }
    let phone = validate_phone(raw_phone).map_err(|e| fail("phone", e.to_string()))?;

    let cpf = match cell(2) {
        "" => None,
        raw => Some(validate_cpf(raw).map_err(|e| fail("cpf", e.to_string()))?),
    };

    let email = match cell(3) {
        "" => None,
        raw => Some(validate_email(raw).map_err(|e| fail("email", e.to_string()))?),
    };

    let raw_tags = cell(4);
    if raw_tags.chars().count() > MAX_TAGS_LENGTH {
        return Err(fail(
            "tags",
            format!("tags must be at most {} characters", MAX_TAGS_LENGTH),
        ));
    }
    let tags: Vec<String> = raw_tags
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tags.len() > MAX_TAGS_PER_ROW {
        return Err(fail(
            "tags",
            format!("max {} tags per row", MAX_TAGS_PER_ROW),
        ));
    }

    Ok(ParsedRow {
        name: name.to_string(),
        phone: phone.national,
        dial_code: phone.dial_code,
        region_code: phone.region_code,
        cpf,
        email,
        tags,
    })
}
