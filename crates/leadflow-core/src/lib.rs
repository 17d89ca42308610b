//! Leadflow Core Library
//!
//! This crate provides the domain models, error types, configuration, row validators
//! and collaborator traits shared by every component of the lead import pipeline.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use collaborators::{
    CacheInvalidator, ChatDirectory, EventEmitter, NoOpCacheInvalidator, NoOpChatDirectory,
    NoOpEventEmitter, NoOpPhoneValidator, PhoneValidator, NOOP_CHAT_ID,
};
pub use config::{Config, ImportLimits};
pub use error::{AppError, ErrorMetadata, LogLevel};
