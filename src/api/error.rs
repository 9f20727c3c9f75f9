use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::StudentField;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            404 => ApiError::NotFound(Self::truncate_body(body)),
            // 422 carries the structured field-error body; one that fails
            // to parse is reported generically instead.
            422 => match serde_json::from_str::<ValidationBody>(body) {
                Ok(parsed) => ApiError::Validation(parsed.error),
                Err(_) => {
                    ApiError::InvalidResponse(format!("422: {}", Self::truncate_body(body)))
                }
            },
            500..=599 => ApiError::ServerError(Self::truncate_body(body)),
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }

    /// Project a mutation error into the per-field validation map.
    ///
    /// A pure view over the error value, so form code can surface messages
    /// without knowing anything about the HTTP client. Non-validation
    /// errors have no field map.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

/// Per-field validation messages from an HTTP 422 body.
///
/// The backend rejects invalid writes with
/// `{ "error": { "email": "Email is invalid" } }`; this is the inner map,
/// keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn get(&self, field: StudentField) -> Option<&str> {
        self.0.get(field.as_str()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Wire shape of a 422 response body.
#[derive(Debug, Deserialize)]
struct ValidationBody {
    error: FieldErrors,
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_not_found() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "no such student");
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(err.field_errors().is_none());
    }

    #[test]
    fn test_from_status_parses_validation_body() {
        let body = r#"{"error":{"email":"Email is invalid"}}"#;
        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, body);
        let map = err.field_errors().expect("422 should carry a field map");
        assert_eq!(map.get(StudentField::Email), Some("Email is invalid"));
        assert_eq!(map.len(), 1);
        assert!(err.is_validation());
    }

    #[test]
    fn test_from_status_unparseable_422_is_generic() {
        let err = ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "<html>nope</html>");
        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert!(err.field_errors().is_none());
    }

    #[test]
    fn test_from_status_server_error() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream died");
        assert!(matches!(err, ApiError::ServerError(_)));
    }

    #[test]
    fn test_truncate_body_limits_length() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        let message = err.to_string();
        assert!(message.contains("truncated, 2000 total bytes"));
        assert!(message.len() < 700);
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        // A multibyte char straddling the cut point must not panic.
        let mut body = "x".repeat(MAX_ERROR_BODY_LENGTH - 1);
        body.push_str("日本語");
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_field_errors_display_joins_fields() {
        let errors: FieldErrors = [
            ("email".to_string(), "Email is invalid".to_string()),
            ("country".to_string(), "Country is required".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            errors.to_string(),
            "country: Country is required; email: Email is invalid"
        );
    }
}
