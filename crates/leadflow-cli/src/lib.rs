//! Leadflow CLI helpers
//!
//! Synthetic import files for load and acceptance testing. Every generated row passes
//! the upload validator.

pub mod generator;

pub use generator::{write_leads_csv, GeneratedLead};

/// Initialize tracing with env filter
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
