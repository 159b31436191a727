//! Submitted forms and their field-level validation.

use std::collections::BTreeMap;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{Comment, Post};

/// Field name -> validation messages.
pub type FormErrors = BTreeMap<String, Vec<String>>;

pub trait FormErrorsExt {
    fn add_error(&mut self, field: &str, message: impl Into<String>);
}

impl FormErrorsExt for FormErrors {
    fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.entry(field.to_string())
            .or_default()
            .push(message.into());
    }
}

/// A form that can check its own fields.
pub trait Form {
    fn validate(&self) -> Result<(), FormErrors>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

struct FieldValidator;

impl FieldValidator {
    fn required(value: &str, field: &str, errors: &mut FormErrors) -> bool {
        if value.trim().is_empty() {
            errors.add_error(field, "This field is required.");
            return false;
        }
        true
    }

    fn max_length(value: &str, max: usize, field: &str, errors: &mut FormErrors) {
        let len = value.trim().chars().count();
        if len > max {
            errors.add_error(
                field,
                format!("Ensure this value has at most {max} characters (it has {len})."),
            );
        }
    }

    fn email(value: &str, field: &str, errors: &mut FormErrors) {
        if !FieldValidator::required(value, field, errors) {
            return;
        }
        FieldValidator::max_length(value, 254, field, errors);
        if !is_valid_email(value.trim()) {
            errors.add_error(field, "Enter a valid email address.");
        }
    }
}

/// Single `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

/// "Recommend this post" form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SharePostForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub comments: Option<String>,
}

/// Subject and body of a share email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareMessage {
    pub subject: String,
    pub body: String,
}

impl Form for SharePostForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if FieldValidator::required(&self.name, "name", &mut errors) {
            FieldValidator::max_length(&self.name, 25, "name", &mut errors);
        }
        FieldValidator::email(&self.email, "email", &mut errors);
        FieldValidator::email(&self.to, "to", &mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl SharePostForm {
    /// Compose the recommendation for `post`, linking to `post_url`.
    pub fn compose(&self, post: &Post, post_url: &str) -> ShareMessage {
        let name = self.name.trim();
        let comments = self.comments.as_deref().unwrap_or("").trim();
        ShareMessage {
            subject: format!(
                "{} ({}) recommends you read {}",
                name,
                self.email.trim(),
                post.title
            ),
            body: format!(
                "Read {} at {}\n\n{}'s comments: {}",
                post.title, post_url, name, comments
            ),
        }
    }

    pub fn recipient(&self) -> &str {
        self.to.trim()
    }
}

/// Reader comment form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub body: String,
}

impl Form for CommentForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        if FieldValidator::required(&self.name, "name", &mut errors) {
            FieldValidator::max_length(&self.name, 80, "name", &mut errors);
        }
        FieldValidator::email(&self.email, "email", &mut errors);
        FieldValidator::required(&self.body, "body", &mut errors);

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl CommentForm {
    /// Build an (active) comment on `post_id`. Call after `validate`.
    pub fn into_comment(self, post_id: Uuid) -> Comment {
        Comment::new(
            post_id,
            self.name.trim().to_string(),
            self.email.trim().to_string(),
            self.body.trim().to_string(),
        )
    }
}

/// Search box. An absent `query` means the form was never submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub query: Option<String>,
}

impl Form for SearchForm {
    fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        FieldValidator::required(self.query.as_deref().unwrap_or(""), "query", &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl SearchForm {
    pub fn is_submitted(&self) -> bool {
        self.query.is_some()
    }

    pub fn cleaned_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}
