//! Data models for the import pipeline
//!
//! Persisted entities (jobs, leads, tags, chat tags and the reference catalog) plus the
//! ephemeral values that flow between the parser, the orchestrator and the worker.

mod catalog;
mod chat;
mod lead;
mod lead_import;
mod row;
mod tag;
mod tenant;

pub use catalog::*;
pub use chat::*;
pub use lead::*;
pub use lead_import::*;
pub use row::*;
pub use tag::*;
pub use tenant::*;
