//! Screen routes and their path grammar.
//!
//! Routes parse from a path-plus-query string and print back to one, so a
//! screen position can round-trip through links, history, and logs.

use std::fmt;

use crate::models::StudentId;
use crate::pagination::page_from_query;

/// One addressable screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    /// The paged student list. The page rides in the query string.
    Students { page: u32 },
    CreateStudent,
    EditStudent { id: StudentId },
    About,
    NotFound,
}

impl Route {
    /// Parse a path like `/students?page=2` into a route.
    ///
    /// Unknown paths and malformed ids fall through to `NotFound`; a
    /// missing or malformed page number reads as page 1. The fixed
    /// `/students/create` segment wins over the id form.
    pub fn parse(input: &str) -> Route {
        let (path, query) = match input.split_once('?') {
            Some((path, query)) => (path, query),
            None => (input, ""),
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Dashboard,
            ["students"] => Route::Students {
                page: page_from_query(query),
            },
            ["students", "create"] => Route::CreateStudent,
            ["students", id] => match id.parse::<StudentId>() {
                Ok(id) => Route::EditStudent { id },
                Err(_) => Route::NotFound,
            },
            ["about"] => Route::About,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Dashboard => "/".to_string(),
            Route::Students { page } => format!("/students?page={}", page),
            Route::CreateStudent => "/students/create".to_string(),
            Route::EditStudent { id } => format!("/students/{}", id),
            Route::About => "/about".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_paths() {
        assert_eq!(Route::parse("/"), Route::Dashboard);
        assert_eq!(Route::parse("/students"), Route::Students { page: 1 });
        assert_eq!(Route::parse("/students/create"), Route::CreateStudent);
        assert_eq!(Route::parse("/students/42"), Route::EditStudent { id: 42 });
        assert_eq!(Route::parse("/about"), Route::About);
        assert_eq!(Route::parse("/nope"), Route::NotFound);
    }

    #[test]
    fn test_create_segment_wins_over_id_form() {
        assert_eq!(Route::parse("/students/create"), Route::CreateStudent);
        assert_eq!(Route::parse("/students/create?page=2"), Route::CreateStudent);
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        assert_eq!(Route::parse("/students/abc"), Route::NotFound);
        assert_eq!(Route::parse("/students/12x"), Route::NotFound);
        assert_eq!(Route::parse("/students/-3"), Route::NotFound);
    }

    #[test]
    fn test_page_comes_from_query() {
        assert_eq!(Route::parse("/students?page=3"), Route::Students { page: 3 });
        assert_eq!(Route::parse("/students?sort=asc&page=7"), Route::Students { page: 7 });
        assert_eq!(Route::parse("/students?page=zero"), Route::Students { page: 1 });
        assert_eq!(Route::parse("/students?page=0"), Route::Students { page: 1 });
    }

    #[test]
    fn test_trailing_slashes_and_deep_paths() {
        assert_eq!(Route::parse("/students/"), Route::Students { page: 1 });
        assert_eq!(Route::parse("/about/"), Route::About);
        assert_eq!(Route::parse("/students/1/edit"), Route::NotFound);
    }

    #[test]
    fn test_path_round_trips() {
        let routes = [
            Route::Dashboard,
            Route::Students { page: 2 },
            Route::CreateStudent,
            Route::EditStudent { id: 9 },
            Route::About,
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }
}
