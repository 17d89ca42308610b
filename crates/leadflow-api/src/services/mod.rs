pub mod lead_import;

pub use lead_import::ImportOrchestrator;
