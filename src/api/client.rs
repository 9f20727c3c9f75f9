//! HTTP client for the student REST backend.
//!
//! This module provides the `StudentApi` struct, a typed wrapper over the
//! backend's JSON endpoints: paged listing, single-record reads, and the
//! create/update/delete writes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::models::{Student, StudentDraft, StudentId, StudentPage};

use super::{ApiError, StudentBackend};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Response header carrying the collection size on paged list responses.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Typed client for the student REST backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct StudentApi {
    client: Client,
    base_url: String,
}

impl StudentApi {
    /// Create a new API client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn students_url(&self) -> String {
        format!("{}/students", self.base_url)
    }

    fn student_url(&self, id: StudentId) -> String {
        format!("{}/students/{}", self.base_url, id)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }
}

#[async_trait]
impl StudentBackend for StudentApi {
    async fn list(&self, page: u32, limit: u32) -> Result<StudentPage, ApiError> {
        let response = self
            .client
            .get(self.students_url())
            .query(&[("_page", page), ("_limit", limit)])
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        // The page body is a bare array; the collection size rides in a
        // response header. A missing or malformed header reads as zero.
        let total = response
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);

        let students: Vec<Student> = Self::parse_json(response, "student page").await?;
        debug!(page, limit, total, count = students.len(), "Fetched student page");

        Ok(StudentPage { students, total })
    }

    async fn get(&self, id: StudentId) -> Result<Student, ApiError> {
        let response = self.client.get(self.student_url(id)).send().await?;
        let response = Self::check_response(response).await?;
        Self::parse_json(response, "student").await
    }

    async fn create(&self, draft: &StudentDraft) -> Result<Student, ApiError> {
        let response = self
            .client
            .post(self.students_url())
            .json(draft)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let student: Student = Self::parse_json(response, "created student").await?;
        debug!(id = student.id, "Created student");
        Ok(student)
    }

    async fn update(&self, id: StudentId, student: &Student) -> Result<Student, ApiError> {
        let response = self
            .client
            .put(self.student_url(id))
            .json(student)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let updated: Student = Self::parse_json(response, "updated student").await?;
        debug!(id, "Updated student");
        Ok(updated)
    }

    async fn delete(&self, id: StudentId) -> Result<(), ApiError> {
        let response = self.client.delete(self.student_url(id)).send().await?;
        Self::check_response(response).await?;
        debug!(id, "Deleted student");
        Ok(())
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, StudentField};
    use mockito::{Matcher, Server};

    fn student_json(id: u64, first: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "first_name": first,
            "last_name": "Tester",
            "email": format!("{}@example.com", first.to_lowercase()),
            "gender": "Female",
            "country": "Iceland",
            "avatar": "https://example.com/a.png",
            "btc_address": "1BoatSLRHtKNngkdXEeobR76b53LETtpyT"
        })
    }

    #[tokio::test]
    async fn test_list_sends_page_params_and_reads_total_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/students")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("_page".into(), "2".into()),
                Matcher::UrlEncoded("_limit".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header(TOTAL_COUNT_HEADER, "57")
            .with_body(
                serde_json::json!([student_json(11, "Ada"), student_json(12, "Grace")])
                    .to_string(),
            )
            .create_async()
            .await;

        let api = StudentApi::new(server.url()).expect("client build");
        let page = api.list(2, 10).await.expect("list failed");

        assert_eq!(page.total, 57);
        assert_eq!(page.students.len(), 2);
        assert_eq!(page.students[0].first_name, "Ada");
        assert_eq!(page.students[1].gender, Gender::Female);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_missing_total_header_reads_as_zero() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/students")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let api = StudentApi::new(server.url()).expect("client build");
        let page = api.list(1, 10).await.expect("list failed");

        assert_eq!(page.total, 0);
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_get_not_found_maps_to_typed_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/students/999")
            .with_status(404)
            .with_body("{}")
            .create_async()
            .await;

        let api = StudentApi::new(server.url()).expect("client build");
        let err = api.get(999).await.expect_err("expected 404");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_surfaces_field_errors_from_422() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/students")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"email":"Email is invalid"}}"#)
            .create_async()
            .await;

        let api = StudentApi::new(server.url()).expect("client build");
        let mut draft = StudentDraft::default();
        draft.first_name = "Ada".to_string();
        draft.email = "not-an-email".to_string();

        let err = api.create(&draft).await.expect_err("expected 422");
        let fields = err.field_errors().expect("validation error expected");
        assert_eq!(fields.get(StudentField::Email), Some("Email is invalid"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_puts_full_record() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/students/11")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "id": 11,
                "first_name": "Ada",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(student_json(11, "Ada").to_string())
            .create_async()
            .await;

        let api = StudentApi::new(server.url()).expect("client build");
        let student: Student =
            serde_json::from_value(student_json(11, "Ada")).expect("fixture parse");
        let updated = api.update(11, &student).await.expect("update failed");

        assert_eq!(updated.id, 11);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_hits_id_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/students/11")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let api = StudentApi::new(server.url()).expect("client build");
        api.delete(11).await.expect("delete failed");
        mock.assert_async().await;
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let api = StudentApi::new("http://localhost:4000/").expect("client build");
        assert_eq!(api.base_url(), "http://localhost:4000");
        assert_eq!(api.students_url(), "http://localhost:4000/students");
        assert_eq!(api.student_url(7), "http://localhost:4000/students/7");
    }
}
