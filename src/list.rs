//! List screen state: the current page of students and its pager.
//!
//! Page loads go through the cache, so revisiting a page renders its last
//! rows immediately while a refresh runs behind them. A failed load keeps
//! the previous rows on screen instead of blanking the table.

use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::api::ApiError;
use crate::cache::{CacheError, StudentQueries};
use crate::models::{Student, StudentId};
use crate::mutation::{MutationState, StudentMutations};
use crate::pagination::{page_from_query, Pager};

/// Maximum concurrent detail prefetches when warming the visible rows.
/// Keeps warmup traffic from crowding out the list fetch itself.
const MAX_CONCURRENT_PREFETCH: usize = 4;

pub struct StudentList {
    queries: StudentQueries,
    mutations: StudentMutations,
    current_page: u32,
    rows: Vec<Student>,
    total: u64,
    loaded_once: bool,
    last_error: Option<CacheError>,
    delete_state: MutationState<()>,
    notice: Option<String>,
}

impl StudentList {
    pub fn new(queries: StudentQueries, mutations: StudentMutations) -> Self {
        Self {
            queries,
            mutations,
            current_page: 1,
            rows: Vec::new(),
            total: 0,
            loaded_once: false,
            last_error: None,
            delete_state: MutationState::default(),
            notice: None,
        }
    }

    /// Open the list at the page named in a query string and load it.
    pub async fn open(&mut self, query: &str) {
        self.current_page = page_from_query(query);
        self.refresh().await;
    }

    /// Jump to a page and load it.
    pub async fn goto_page(&mut self, page: u32) {
        self.current_page = page;
        self.refresh().await;
    }

    /// Reload the current page through the cache.
    /// On failure the previous rows stay on screen.
    pub async fn refresh(&mut self) {
        match self.queries.page(self.current_page).await {
            Ok(page) => {
                self.rows = page.students;
                self.total = page.total;
                self.loaded_once = true;
                self.last_error = None;
            }
            Err(error) => {
                warn!(page = self.current_page, error = %error, "List load failed");
                self.last_error = Some(error);
            }
        }
    }

    /// Delete a record, then reload the page it was shown on.
    pub async fn delete(&mut self, id: StudentId) {
        self.delete_state.begin();
        match self.mutations.delete(id, self.current_page).await {
            Ok(()) => {
                self.delete_state.finish(Ok(()));
                self.notice = Some(format!("Delete Successfully Student with ID = {}", id));
                self.refresh().await;
            }
            Err(error) => {
                warn!(id, error = %error, "Delete failed");
                self.delete_state.finish(Err(error));
            }
        }
    }

    /// Warm the detail cache for one row, ahead of an expected open.
    /// Runs in the background; failures surface only in logs.
    pub fn prefetch_hint(&self, id: StudentId) {
        let queries = self.queries.clone();
        tokio::spawn(async move {
            queries.prefetch_student(id).await;
        });
    }

    /// Warm the detail cache for every visible row, a few at a time.
    pub async fn prefetch_visible(&self) {
        let ids: Vec<StudentId> = self.rows.iter().map(|s| s.id).collect();
        stream::iter(ids)
            .map(|id| {
                let queries = self.queries.clone();
                async move { queries.prefetch_student(id).await }
            })
            .buffer_unordered(MAX_CONCURRENT_PREFETCH)
            .for_each(|_| async {})
            .await;
    }

    pub fn rows(&self) -> &[Student] {
        &self.rows
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// False until the first successful load; the screen shows a loading
    /// placeholder instead of an empty table.
    pub fn loaded_once(&self) -> bool {
        self.loaded_once
    }

    pub fn pager(&self) -> Pager {
        Pager::from_counts(self.current_page, self.total, self.queries.page_size())
    }

    pub fn last_error(&self) -> Option<&CacheError> {
        self.last_error.as_ref()
    }

    pub fn delete_error(&self) -> Option<&ApiError> {
        self.delete_state.error()
    }

    /// Pop the queued delete notice, if any.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Fetches currently running anywhere in the cache. Drives the busy
    /// indicator.
    pub fn in_flight(&self) -> usize {
        self.queries.cache().in_flight_count()
    }
}

// ============================================================
// Tests
// ============================================================
