//! Per-account import rate limiting
//!
//! Counts are read from prior job records inside a trailing window, so the limiter holds
//! no state of its own.

pub use limiter::ImportRateLimiter;

mod limiter;
