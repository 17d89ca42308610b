//! Test helpers for pipeline unit tests
//!
//! Provides an in-memory implementation of both store traits so the orchestrator and the
//! worker can be exercised without a database.

pub mod in_memory_store;

pub use in_memory_store::InMemoryStore;
