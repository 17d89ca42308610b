//! Leadflow Worker
//!
//! Runs accepted imports detached from the request that submitted them. Each job walks
//! dedup, tag and channel resolution and row materialization, then always reaches a
//! single finalization step that records the outcome.

pub mod context;
pub mod job;
pub mod pipeline;
pub mod queue;

pub use context::ImportContext;
pub use job::{ImportFinished, ImportJob};
pub use pipeline::{ImportAbort, ImportWorker, IMPORT_FINISHED_EVENT};
pub use queue::{ImportFinishedSender, ImportQueue, QueueClosed};
