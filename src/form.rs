//! Create/edit form state machine.
//!
//! The form owns a local draft of the record being written. Field edits
//! land in the draft only; nothing touches the backend until submit. A
//! failed submit keeps the draft so the user can correct it, and any edit
//! after a finished submit clears that outcome and returns to plain
//! editing.

use crate::api::FieldErrors;
use crate::cache::{CacheError, StudentQueries};
use crate::models::{FieldEdit, Student, StudentDraft, StudentId};
use crate::mutation::{MutationState, StudentMutations};

/// What the form writes on submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(StudentId),
}

/// Where the form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Edit mode only: the record is still being fetched.
    Loading,
    Editing,
    Submitting,
    Success,
    /// The backend rejected the draft; per-field messages are available.
    ValidationFailed,
    OtherError,
}

pub struct StudentForm {
    mode: FormMode,
    phase: FormPhase,
    draft: StudentDraft,
    mutation: MutationState<Student>,
    load_error: Option<CacheError>,
    notice: Option<String>,
}

impl StudentForm {
    /// A blank create form, ready for editing.
    pub fn create() -> Self {
        Self {
            mode: FormMode::Create,
            phase: FormPhase::Editing,
            draft: StudentDraft::default(),
            mutation: MutationState::default(),
            load_error: None,
            notice: None,
        }
    }

    /// An edit form for `id`. Call `load` to populate the draft.
    pub fn edit(id: StudentId) -> Self {
        Self {
            mode: FormMode::Edit(id),
            phase: FormPhase::Loading,
            draft: StudentDraft::default(),
            mutation: MutationState::default(),
            load_error: None,
            notice: None,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn draft(&self) -> &StudentDraft {
        &self.draft
    }

    /// Populate the draft from the record under edit. Reads through the
    /// cache, so a prefetched record opens without a network round trip.
    pub async fn load(&mut self, queries: &StudentQueries) {
        let FormMode::Edit(id) = self.mode else {
            return;
        };

        match queries.student(id).await {
            Ok(student) => {
                self.draft = StudentDraft::from_student(&student);
                self.load_error = None;
                self.phase = FormPhase::Editing;
            }
            Err(error) => {
                self.load_error = Some(error);
                self.phase = FormPhase::OtherError;
            }
        }
    }

    /// Apply one field edit to the draft.
    ///
    /// An edit on a finished submit clears its outcome and returns the
    /// form to editing. Edits while the record is still loading are
    /// dropped; the load would overwrite them.
    pub fn apply(&mut self, edit: FieldEdit) {
        if self.phase == FormPhase::Loading {
            return;
        }
        self.draft.apply(edit);
        if matches!(
            self.phase,
            FormPhase::Success | FormPhase::ValidationFailed | FormPhase::OtherError
        ) {
            self.mutation.reset();
            self.load_error = None;
            self.phase = FormPhase::Editing;
        }
    }

    /// Submit the draft. Create posts it as-is; edit sends the full
    /// record rebuilt around the loaded id.
    ///
    /// On success the draft resets to blank and a notice is queued. On a
    /// validation rejection the draft stays put and the per-field
    /// messages become available.
    pub async fn submit(&mut self, mutations: &StudentMutations) {
        if matches!(self.phase, FormPhase::Loading | FormPhase::Submitting) {
            return;
        }

        self.phase = FormPhase::Submitting;
        self.mutation.begin();

        let result = match self.mode {
            FormMode::Create => mutations.create(&self.draft).await,
            FormMode::Edit(id) => {
                let record = self.draft.clone().into_student(id);
                mutations.update(id, &record).await
            }
        };

        match &result {
            Ok(_) => {
                self.phase = FormPhase::Success;
                self.notice = Some(match self.mode {
                    FormMode::Create => "Created Successfully".to_string(),
                    FormMode::Edit(_) => "Updated Successfully".to_string(),
                });
                self.draft = StudentDraft::default();
            }
            Err(error) if error.is_validation() => {
                self.phase = FormPhase::ValidationFailed;
            }
            Err(_) => {
                self.phase = FormPhase::OtherError;
            }
        }
        self.mutation.finish(result);
    }

    /// The record the last successful submit produced.
    pub fn submitted_student(&self) -> Option<&Student> {
        self.mutation.value()
    }

    /// Per-field messages from a validation rejection.
    pub fn errors(&self) -> Option<&FieldErrors> {
        self.mutation.field_errors()
    }

    /// Displayable message for a non-validation failure.
    pub fn error_message(&self) -> Option<String> {
        if let Some(error) = &self.load_error {
            return Some(error.to_string());
        }
        if self.phase == FormPhase::OtherError {
            return self.mutation.error().map(|e| e.to_string());
        }
        None
    }

    /// Pop the queued success notice, if any.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MemoryBackend, StudentBackend};
    use crate::cache::QueryCache;
    use crate::models::{Gender, StudentField};
    use std::sync::Arc;

    fn fixture(seeded: usize) -> (Arc<MemoryBackend>, StudentQueries, StudentMutations) {
        let backend = Arc::new(MemoryBackend::seeded(seeded));
        let queries = StudentQueries::new(QueryCache::new(), backend.clone(), 10);
        let mutations = StudentMutations::new(backend.clone(), queries.clone());
        (backend, queries, mutations)
    }

    #[test]
    fn test_create_form_starts_editing_blank() {
        let form = StudentForm::create();
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.draft().gender, Gender::Other);
        assert!(form.draft().first_name.is_empty());
    }

    #[tokio::test]
    async fn test_create_success_resets_draft_and_notices() {
        let (backend, _queries, mutations) = fixture(3);
        let mut form = StudentForm::create();

        form.apply(FieldEdit::FirstName("Ada".to_string()));
        form.apply(FieldEdit::Email("ada@example.com".to_string()));
        form.submit(&mutations).await;

        assert_eq!(form.phase(), FormPhase::Success);
        assert_eq!(form.take_notice().as_deref(), Some("Created Successfully"));
        assert_eq!(form.take_notice(), None);
        assert_eq!(form.draft(), &StudentDraft::default());
        assert_eq!(form.submitted_student().map(|s| s.id), Some(4));
        assert_eq!(backend.student_count().await, 4);
    }

    #[tokio::test]
    async fn test_validation_failure_keeps_draft_and_maps_fields() {
        let (backend, _queries, mutations) = fixture(0);
        let mut form = StudentForm::create();

        form.apply(FieldEdit::FirstName("Ada".to_string()));
        form.apply(FieldEdit::Email("missing-at-sign".to_string()));
        form.submit(&mutations).await;

        assert_eq!(form.phase(), FormPhase::ValidationFailed);
        let errors = form.errors().expect("field errors expected");
        assert_eq!(errors.get(StudentField::Email), Some("Email is invalid"));
        assert_eq!(form.draft().first_name, "Ada");
        assert_eq!(backend.student_count().await, 0);
    }

    #[tokio::test]
    async fn test_edit_after_failure_returns_to_editing() {
        let (_backend, _queries, mutations) = fixture(0);
        let mut form = StudentForm::create();

        form.apply(FieldEdit::Email("bad".to_string()));
        form.submit(&mutations).await;
        assert_eq!(form.phase(), FormPhase::ValidationFailed);

        form.apply(FieldEdit::Email("good@example.com".to_string()));
        assert_eq!(form.phase(), FormPhase::Editing);
        assert!(form.errors().is_none());
    }

    #[tokio::test]
    async fn test_edit_form_loads_record_into_draft() {
        let (_backend, queries, _mutations) = fixture(3);
        let mut form = StudentForm::edit(2);
        assert_eq!(form.phase(), FormPhase::Loading);

        form.load(&queries).await;

        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.draft().first_name, "Student2");
    }

    #[tokio::test]
    async fn test_edit_success_updates_record_and_notices() {
        let (backend, queries, mutations) = fixture(3);
        let mut form = StudentForm::edit(2);
        form.load(&queries).await;

        form.apply(FieldEdit::FirstName("Renamed".to_string()));
        form.submit(&mutations).await;

        assert_eq!(form.phase(), FormPhase::Success);
        assert_eq!(form.take_notice().as_deref(), Some("Updated Successfully"));
        assert_eq!(form.draft(), &StudentDraft::default());

        let stored = backend.get(2).await.unwrap();
        assert_eq!(stored.first_name, "Renamed");
    }

    #[tokio::test]
    async fn test_load_failure_is_other_error() {
        let (backend, queries, _mutations) = fixture(3);
        backend.set_fail_reads(true);

        let mut form = StudentForm::edit(1);
        form.load(&queries).await;

        assert_eq!(form.phase(), FormPhase::OtherError);
        assert!(form.error_message().is_some());
    }

    #[tokio::test]
    async fn test_submit_is_blocked_while_loading() {
        let (backend, _queries, mutations) = fixture(3);
        let mut form = StudentForm::edit(1);

        form.submit(&mutations).await;

        assert_eq!(form.phase(), FormPhase::Loading);
        assert_eq!(backend.update_calls(), 0);
        assert_eq!(backend.create_calls(), 0);
    }
}
