//! Leadflow API Library
//!
//! This crate provides the HTTP handlers, authentication, the import orchestrator and
//! application setup.

mod api_doc;
mod handlers;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use error::HttpAppError;
pub use services::ImportOrchestrator;
