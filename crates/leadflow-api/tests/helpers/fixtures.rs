//! Upload bodies

use axum_test::multipart::{MultipartForm, Part};
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};

use super::{ACCOUNT_ID, SOURCE_ID};

pub const HEADER: [&str; 5] = ["name", "phone", "cpf", "email", "tags"];

pub fn import_data(name: &str) -> Value {
    json!({
        "name": name,
        "account_id": ACCOUNT_ID,
        "source_id": SOURCE_ID,
        "tag_ids": [],
    })
}

/// CSV with the standard header followed by `rows`
pub fn csv(rows: &[[&str; 5]]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).unwrap();
    for row in rows {
        writer.write_record(row).unwrap();
    }
    writer.into_inner().unwrap()
}

/// Single-sheet workbook with the standard header followed by `rows`
pub fn xlsx(rows: &[[&str; 5]]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, title) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *title).unwrap();
    }
    for (i, row) in rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string(i as u32 + 1, col as u16, *cell).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

pub fn form(data: &Value, file_name: &str, file: Vec<u8>) -> MultipartForm {
    MultipartForm::new()
        .add_text("data", data.to_string())
        .add_part("file", Part::bytes(file).file_name(file_name))
}
