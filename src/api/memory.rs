//! In-memory student backend for tests and offline demo runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::api::{ApiError, FieldErrors, StudentBackend};
use crate::models::{Gender, Student, StudentDraft, StudentId, StudentPage};

struct Inner {
    students: Vec<Student>,
    next_id: StudentId,
}

/// In-memory `StudentBackend` with the same paging and validation rules as
/// the HTTP backend. Call counters let tests assert on fetch traffic, and
/// the fail switches simulate an unreachable server.
pub struct MemoryBackend {
    inner: RwLock<Inner>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_students(Vec::new())
    }

    pub fn with_students(students: Vec<Student>) -> Self {
        let next_id = students.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(Inner { students, next_id }),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    /// Seed `count` generated students with ids 1..=count.
    pub fn seeded(count: usize) -> Self {
        let students = (1..=count as StudentId).map(Self::sample_student).collect();
        Self::with_students(students)
    }

    /// Deterministic fixture record, also used by tests in other modules.
    pub fn sample_student(id: StudentId) -> Student {
        Student {
            id,
            first_name: format!("Student{}", id),
            last_name: "Example".to_string(),
            email: format!("student{}@example.com", id),
            gender: Gender::Other,
            country: "Norway".to_string(),
            avatar: format!("https://example.com/avatars/{}.png", id),
            btc_address: String::new(),
        }
    }

    /// Make list/get return a server error until cleared.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make create/update/delete return a server error until cleared.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub async fn student_count(&self) -> usize {
        self.inner.read().await.students.len()
    }

    fn validate_email(email: &str) -> Result<(), ApiError> {
        if email.contains('@') {
            Ok(())
        } else {
            let errors: FieldErrors =
                [("email".to_string(), "Email is invalid".to_string())]
                    .into_iter()
                    .collect();
            Err(ApiError::Validation(errors))
        }
    }

    fn read_failure(&self) -> Result<(), ApiError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(ApiError::ServerError("Simulated read outage".to_string()))
        } else {
            Ok(())
        }
    }

    fn write_failure(&self) -> Result<(), ApiError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(ApiError::ServerError("Simulated write outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StudentBackend for MemoryBackend {
    async fn list(&self, page: u32, limit: u32) -> Result<StudentPage, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.read_failure()?;

        let inner = self.inner.read().await;
        let total = inner.students.len() as u64;
        let start = (page.max(1) as usize - 1).saturating_mul(limit as usize);
        let students = inner
            .students
            .iter()
            .skip(start)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(StudentPage { students, total })
    }

    async fn get(&self, id: StudentId) -> Result<Student, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.read_failure()?;

        let inner = self.inner.read().await;
        inner
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Student {} not found", id)))
    }

    async fn create(&self, draft: &StudentDraft) -> Result<Student, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.write_failure()?;
        Self::validate_email(&draft.email)?;

        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        let student = draft.clone().into_student(id);
        inner.students.push(student.clone());
        Ok(student)
    }

    async fn update(&self, id: StudentId, student: &Student) -> Result<Student, ApiError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.write_failure()?;
        Self::validate_email(&student.email)?;

        let mut inner = self.inner.write().await;
        let slot = inner
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("Student {} not found", id)))?;

        // The path id is authoritative; the body cannot re-identify a record.
        *slot = Student {
            id,
            ..student.clone()
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: StudentId) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.write_failure()?;

        let mut inner = self.inner.write().await;
        let before = inner.students.len();
        inner.students.retain(|s| s.id != id);
        if inner.students.len() == before {
            return Err(ApiError::NotFound(format!("Student {} not found", id)));
        }
        Ok(())
    }
}

// ============================================================
// Tests
// ============================================================
