//! Database repositories for the import pipeline
//!
//! One repository per table family. They speak `AppError` and are wrapped by
//! [`crate::store::PgLeadImportStore`] for consumers that depend on the store traits.

pub mod catalog;
pub mod chat_tag;
pub mod lead;
pub mod lead_import;
pub mod patient;
pub mod tag;

pub use catalog::CatalogRepository;
pub use chat_tag::ChatTagRepository;
pub use lead::LeadRepository;
pub use lead_import::LeadImportRepository;
pub use patient::PatientRepository;
pub use tag::TagRepository;
