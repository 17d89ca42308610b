pub mod health;
pub mod imports;
pub mod lead_import;
