//! Leadflow Database Layer
//!
//! Postgres repositories for import jobs, leads, tags and the reference catalog, plus the
//! store traits the pipeline depends on.

pub mod db;
pub mod store;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use db::{
    CatalogRepository, ChatTagRepository, LeadImportRepository, LeadRepository,
    PatientRepository, TagRepository,
};
pub use store::{ImportJobStore, LeadStore, PgLeadImportStore};

/// Embedded schema migrations, applied at startup
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
