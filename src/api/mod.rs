//! REST API layer for the student backend.
//!
//! This module provides the `StudentBackend` trait along with its two
//! implementations: `StudentApi`, the HTTP client for the real service,
//! and `MemoryBackend`, an in-process stand-in for tests and demos.
//!
//! List responses report the collection size via the `x-total-count`
//! response header rather than in the body.

pub mod backend;
pub mod client;
pub mod error;
pub mod memory;

pub use backend::StudentBackend;
pub use client::{StudentApi, TOTAL_COUNT_HEADER};
pub use error::{ApiError, FieldErrors};
pub use memory::MemoryBackend;
