//! Cache keys identifying list and detail queries.

use std::fmt;

use crate::models::StudentId;

/// Identity of a cached query.
///
/// List pages are keyed per page so each page caches independently, and a
/// detail record is keyed by id so a prefetched record survives navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// One page of the student list.
    Students { page: u32, limit: u32 },
    /// A single student record.
    Student { id: StudentId },
}

impl QueryKey {
    pub fn is_student_list(&self) -> bool {
        matches!(self, QueryKey::Students { .. })
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Students { page, limit } => {
                write!(f, "students?page={}&limit={}", page, limit)
            }
            QueryKey::Student { id } => write!(f, "student/{}", id),
        }
    }
}
