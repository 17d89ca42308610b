//! Leadflow File Processing Library
//!
//! Decodes uploaded contact sheets (CSV or spreadsheet) and validates them row by row
//! into canonical [`ParsedRow`](leadflow_core::models::ParsedRow)s.

pub mod decode;
pub mod file_parser;

pub use decode::{decode_table, FileFormat};
pub use file_parser::{FileParseError, FileParser, ParsedFile, EXPECTED_COLUMNS, MAX_DATA_ROWS};
