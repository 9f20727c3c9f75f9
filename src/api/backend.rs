use async_trait::async_trait;

use crate::api::ApiError;
use crate::models::{Student, StudentDraft, StudentId, StudentPage};

/// Abstraction over the student REST backend.
///
/// The cache and mutation layers talk to this trait rather than to a
/// concrete HTTP client, so tests can swap in an in-memory backend.
#[async_trait]
pub trait StudentBackend: Send + Sync {
    /// Fetch one page of students. `page` is 1-based.
    async fn list(&self, page: u32, limit: u32) -> Result<StudentPage, ApiError>;

    /// Fetch a single student by id.
    async fn get(&self, id: StudentId) -> Result<Student, ApiError>;

    /// Create a student from a draft. The backend assigns the id.
    async fn create(&self, draft: &StudentDraft) -> Result<Student, ApiError>;

    /// Replace an existing student's fields.
    async fn update(&self, id: StudentId, student: &Student) -> Result<Student, ApiError>;

    /// Delete a student by id.
    async fn delete(&self, id: StudentId) -> Result<(), ApiError>;
}
