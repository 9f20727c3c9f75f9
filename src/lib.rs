//! Rostercache - a cached client-side data layer for a student roster API.
//!
//! The crate wraps a student REST backend in the state a CRUD admin needs:
//!
//! - `api`: typed HTTP client, error taxonomy, and an in-memory stand-in
//! - `cache`: keyed query cache with staleness, de-dup, and invalidation
//! - `models`: the student record and its wire shapes
//! - `mutation`, `form`, `list`: write flows and per-screen state machines
//! - `pagination`, `routes`: page math and the app's path table
//! - `config`, `output`: configuration loading and table rendering
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use rostercache::{MemoryBackend, QueryCache, StudentQueries};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = Arc::new(MemoryBackend::seeded(25));
//!     let queries = StudentQueries::new(QueryCache::new(), backend, 10);
//!     let page = queries.page(1).await?;
//!     println!("{} students enrolled", page.total);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod form;
pub mod list;
pub mod models;
pub mod mutation;
pub mod output;
pub mod pagination;
pub mod routes;

// Re-export commonly used types for convenience
pub use api::{ApiError, MemoryBackend, StudentApi, StudentBackend};
pub use cache::{QueryCache, QueryKey, StudentQueries};
pub use config::Config;
pub use models::{Student, StudentDraft, StudentId, StudentPage};
pub use mutation::StudentMutations;
