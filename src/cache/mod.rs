//! Client-side query caching.
//!
//! This module provides the keyed `QueryCache` and the typed
//! `StudentQueries` layer on top of it. Values are cached per query key,
//! served while fresh, revalidated in the background once stale, and
//! refetched after invalidation.
//!
//! Cached query shapes:
//! - one entry per student list page
//! - one entry per student record

pub mod key;
pub mod queries;
pub mod store;

pub use key::QueryKey;
pub use queries::{StudentQueries, STUDENT_FRESH_SECS};
pub use store::{CacheError, CacheEvent, QueryCache, QueryOptions};
