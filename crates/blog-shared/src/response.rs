//! Error response types (RFC 7807 Problem Details).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Field name -> validation messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// RFC 7807 Problem Details for HTTP APIs.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type.
    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Per-field validation messages (extension member).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            instance: None,
            errors: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found").with_detail(detail)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405, "Method Not Allowed")
    }

    pub fn unprocessable(errors: FieldErrors) -> Self {
        Self::new(422, "Validation Failed").with_errors(errors)
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_problem_type_and_skips_empty_members() {
        let json = serde_json::to_value(ErrorResponse::not_found("Post abc not found")).unwrap();

        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["status"], 404);
        assert_eq!(json["detail"], "Post abc not found");
        assert!(json.get("errors").is_none());
        assert!(json.get("instance").is_none());
    }

    #[test]
    fn carries_field_errors() {
        let errors = FieldErrors::from([("name".to_string(), vec!["Required.".to_string()])]);
        let json = serde_json::to_value(ErrorResponse::unprocessable(errors)).unwrap();

        assert_eq!(json["status"], 422);
        assert_eq!(json["errors"]["name"][0], "Required.");
    }
}
