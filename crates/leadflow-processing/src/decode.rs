//! Byte stream to table-of-strings decoding for the supported upload formats.

use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader};

use crate::file_parser::FileParseError;

/// Upload encodings accepted by the import endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    /// Pick the decoder from the file name extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, FileParseError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Spreadsheet),
            _ => Err(FileParseError::UnsupportedFormat(extension)),
        }
    }
}

/// Decode `bytes` into rows of raw cells. Cells are returned untrimmed.
pub fn decode_table(bytes: &[u8], format: FileFormat) -> Result<Vec<Vec<String>>, FileParseError> {
    match format {
        FileFormat::Csv => decode_csv(bytes),
        FileFormat::Spreadsheet => decode_spreadsheet(bytes),
    }
}

fn decode_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>, FileParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(|e| FileParseError::Decode(e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cells = record
            .iter()
            .map(|field| {
                std::str::from_utf8(field).map(str::to_string).map_err(|_| {
                    FileParseError::Decode(format!(
                        "file is not valid UTF-8 (line {}); export it as UTF-8 CSV",
                        line
                    ))
                })
            })
            .collect::<Result<Vec<String>, _>>()?;
        rows.push(cells);
    }

    strip_bom(&mut rows);
    Ok(rows)
}

/// Only the first worksheet is read.
fn decode_spreadsheet(bytes: &[u8]) -> Result<Vec<Vec<String>>, FileParseError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| FileParseError::Decode(e.to_string()))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| FileParseError::Decode(e.to_string()))?,
        None => return Ok(Vec::new()),
    };

    let rows = range
        .rows()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(cell_to_string).collect();
            while cells.last().is_some_and(|c| c.trim().is_empty()) {
                cells.pop();
            }
            cells
        })
        .collect();

    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        // Phones and CPFs typed as numbers arrive as floats
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => format!("{}", f),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({:?})", e),
        Data::DateTime(dt) => format!("{}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

fn strip_bom(rows: &mut [Vec<String>]) {
    if let Some(first) = rows.first_mut().and_then(|row| row.first_mut()) {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
}
