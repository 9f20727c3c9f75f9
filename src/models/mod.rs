//! Data models for the student resource.
//!
//! This module contains the structures the rest of the crate moves around:
//!
//! - `Student`, `StudentDraft`: the server record and the form's local draft
//! - `Gender`: the backend's gender vocabulary with a lossy catch-all
//! - `StudentField`, `FieldEdit`: tagged per-field draft edits
//! - `StudentPage`: one list page plus the out-of-band total count

pub mod student;

pub use student::{
    FieldEdit, Gender, Student, StudentDraft, StudentField, StudentId, StudentPage,
};
