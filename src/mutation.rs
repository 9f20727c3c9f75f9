//! Write operations and their cache side effects.
//!
//! Each write keeps the cache honest on its own terms:
//! - create takes every cached list page out of service, because the new
//!   record can land on any of them
//! - update seeds the detail cache with the server's response
//! - delete takes the page the record was shown on out of service

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiError, FieldErrors, StudentBackend};
use crate::cache::StudentQueries;
use crate::models::{Student, StudentDraft, StudentId};

/// Lifecycle of one tracked write.
#[derive(Debug, Clone)]
pub enum MutationState<T> {
    Idle,
    Pending,
    Success(T),
    Failed(Arc<ApiError>),
}

impl<T> MutationState<T> {
    pub fn begin(&mut self) {
        *self = MutationState::Pending;
    }

    pub fn finish(&mut self, result: Result<T, ApiError>) {
        *self = match result {
            Ok(value) => MutationState::Success(value),
            Err(error) => MutationState::Failed(Arc::new(error)),
        };
    }

    pub fn reset(&mut self) {
        *self = MutationState::Idle;
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MutationState::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            MutationState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            MutationState::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Per-field messages when the write failed validation.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        self.error().and_then(ApiError::field_errors)
    }
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        MutationState::Idle
    }
}

/// Student write operations.
/// Clone is cheap - shared handles all the way down.
#[derive(Clone)]
pub struct StudentMutations {
    backend: Arc<dyn StudentBackend>,
    queries: StudentQueries,
}

impl StudentMutations {
    pub fn new(backend: Arc<dyn StudentBackend>, queries: StudentQueries) -> Self {
        Self { backend, queries }
    }

    pub fn queries(&self) -> &StudentQueries {
        &self.queries
    }

    /// Create a student, then take every cached list page out of service.
    pub async fn create(&self, draft: &StudentDraft) -> Result<Student, ApiError> {
        let student = self.backend.create(draft).await?;
        info!(id = student.id, "Created student");
        self.queries.invalidate_all_pages();
        Ok(student)
    }

    /// Replace a student's fields and seed the detail cache with the
    /// server's response.
    pub async fn update(&self, id: StudentId, student: &Student) -> Result<Student, ApiError> {
        let updated = self.backend.update(id, student).await?;
        info!(id, "Updated student");
        if let Err(error) = self.queries.store_student(&updated) {
            warn!(id, error = %error, "Failed to seed detail cache");
        }
        Ok(updated)
    }

    /// Delete a student and take the list page it was shown on out of
    /// service.
    pub async fn delete(&self, id: StudentId, page: u32) -> Result<(), ApiError> {
        self.backend.delete(id).await?;
        info!(id, page, "Deleted student");
        self.queries.invalidate_page(page);
        Ok(())
    }
}

// ============================================================
// Tests
// ============================================================
