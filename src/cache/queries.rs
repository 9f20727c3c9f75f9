//! Typed student queries over the shared cache.
//!
//! This is the layer the list and form screens talk to. It maps the two
//! query shapes onto cache keys and freshness policies:
//! - list pages are served from cache but revalidated on every access
//! - detail records stay fresh for a short window, so a prefetch on hover
//!   is still warm when the edit screen opens

use std::sync::Arc;

use crate::api::StudentBackend;
use crate::models::{Student, StudentId, StudentPage};

use super::{CacheError, QueryCache, QueryKey, QueryOptions};

/// Freshness window for detail records in seconds.
/// 10s covers the hover-to-open gap without serving long-dead records.
pub const STUDENT_FRESH_SECS: i64 = 10;

/// Typed access to cached student data.
/// Clone is cheap - the cache and backend are shared handles.
#[derive(Clone)]
pub struct StudentQueries {
    cache: QueryCache,
    backend: Arc<dyn StudentBackend>,
    page_size: u32,
    fresh_secs: i64,
}

impl StudentQueries {
    pub fn new(cache: QueryCache, backend: Arc<dyn StudentBackend>, page_size: u32) -> Self {
        Self {
            cache,
            backend,
            page_size,
            fresh_secs: STUDENT_FRESH_SECS,
        }
    }

    /// Override the detail-record freshness window (config-driven).
    pub fn with_fresh_secs(mut self, secs: i64) -> Self {
        self.fresh_secs = secs;
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn list_key(&self, page: u32) -> QueryKey {
        QueryKey::Students {
            page,
            limit: self.page_size,
        }
    }

    /// Fetch one list page through the cache.
    pub async fn page(&self, page: u32) -> Result<StudentPage, CacheError> {
        let backend = self.backend.clone();
        let limit = self.page_size;
        self.cache
            .get(self.list_key(page), QueryOptions::always_stale(), move || async move {
                backend.list(page, limit).await
            })
            .await
    }

    /// Fetch one student record through the cache.
    pub async fn student(&self, id: StudentId) -> Result<Student, CacheError> {
        let backend = self.backend.clone();
        self.cache
            .get(
                QueryKey::Student { id },
                QueryOptions::fresh_for_secs(self.fresh_secs),
                move || async move { backend.get(id).await },
            )
            .await
    }

    /// Warm the record for `id` ahead of an expected open.
    pub async fn prefetch_student(&self, id: StudentId) {
        let backend = self.backend.clone();
        self.cache
            .prefetch::<Student, _, _>(
                QueryKey::Student { id },
                QueryOptions::fresh_for_secs(self.fresh_secs),
                move || async move { backend.get(id).await },
            )
            .await;
    }

    /// Store a freshly written record so the next detail read is warm.
    pub fn store_student(&self, student: &Student) -> Result<(), CacheError> {
        self.cache.put(
            QueryKey::Student { id: student.id },
            QueryOptions::fresh_for_secs(self.fresh_secs),
            student,
        )
    }

    /// Take one list page out of service.
    pub fn invalidate_page(&self, page: u32) {
        self.cache.invalidate(&self.list_key(page));
    }

    /// Take every cached list page out of service. Returns how many pages
    /// were marked.
    pub fn invalidate_all_pages(&self) -> usize {
        self.cache.invalidate_matching(QueryKey::is_student_list)
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use std::time::Duration as StdDuration;

    fn queries(backend: Arc<MemoryBackend>) -> StudentQueries {
        StudentQueries::new(QueryCache::new(), backend, 10)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(StdDuration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(StdDuration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_page_serves_cached_rows_and_revalidates() {
        let backend = Arc::new(MemoryBackend::seeded(25));
        let q = queries(backend.clone());

        let first = q.page(1).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first.total, 25);
        assert_eq!(backend.list_calls(), 1);

        // Second access is served from cache, with a refresh in the
        // background.
        let second = q.page(1).await.unwrap();
        assert_eq!(second, first);

        let b = backend.clone();
        wait_until(move || b.list_calls() == 2).await;
    }

    #[tokio::test]
    async fn test_student_is_fresh_within_window() {
        let backend = Arc::new(MemoryBackend::seeded(3));
        let q = queries(backend.clone());

        let student = q.student(2).await.unwrap();
        assert_eq!(student.id, 2);
        assert_eq!(backend.get_calls(), 1);

        let again = q.student(2).await.unwrap();
        assert_eq!(again, student);
        assert_eq!(backend.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_fresh_window_revalidates_every_read() {
        let backend = Arc::new(MemoryBackend::seeded(3));
        let q = queries(backend.clone()).with_fresh_secs(0);

        let student = q.student(2).await.unwrap();
        assert_eq!(backend.get_calls(), 1);

        // The entry is already past its window, so the second read serves
        // it stale and revalidates behind it.
        let again = q.student(2).await.unwrap();
        assert_eq!(again, student);

        let b = backend.clone();
        wait_until(move || b.get_calls() == 2).await;
    }

    #[tokio::test]
    async fn test_prefetched_student_reads_warm() {
        let backend = Arc::new(MemoryBackend::seeded(3));
        let q = queries(backend.clone());

        q.prefetch_student(1).await;
        assert_eq!(backend.get_calls(), 1);

        let student = q.student(1).await.unwrap();
        assert_eq!(student.id, 1);
        assert_eq!(backend.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_pages_forces_refetch() {
        let backend = Arc::new(MemoryBackend::seeded(25));
        let q = queries(backend.clone());

        q.page(1).await.unwrap();
        q.page(2).await.unwrap();
        let before = backend.list_calls();

        assert_eq!(q.invalidate_all_pages(), 2);

        // Invalidated pages block on a refetch instead of serving the old
        // rows.
        q.page(1).await.unwrap();
        assert!(backend.list_calls() > before);
    }

    #[tokio::test]
    async fn test_store_student_seeds_detail_read() {
        let backend = Arc::new(MemoryBackend::seeded(3));
        let q = queries(backend.clone());

        let mut edited = MemoryBackend::sample_student(2);
        edited.first_name = "Edited".to_string();
        q.store_student(&edited).unwrap();

        let read = q.student(2).await.unwrap();
        assert_eq!(read.first_name, "Edited");
        assert_eq!(backend.get_calls(), 0);
    }
}
