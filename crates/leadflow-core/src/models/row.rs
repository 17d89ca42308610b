use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One validated data row of an import file, already in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub name: String,
    /// Digits-only national number
    pub phone: String,
    pub dial_code: String,
    pub region_code: String,
    pub cpf: Option<String>,
    pub email: Option<String>,
    pub tags: Vec<String>,
}

/// A file-level validation failure for a single data row.
///
/// `row` is the spreadsheet line number, so the first data row is 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RowError {
    pub row: usize,
    pub column: String,
    pub message: String,
}
