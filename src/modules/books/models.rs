use serde::{Deserialize, Serialize};
use serde_json::Value;

use shelf_http::ApiError;

/// Domain model for the books module.
///
/// Identity is positional: a book carries no id field, its external
/// identifier is its current index in the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Year the book was published
    pub publication_year: i64,
}

impl Book {
    /// Construct a book from an untyped JSON payload, collecting a
    /// per-field validation detail for every problem found.
    ///
    /// Fields are required but may be empty strings; types are strict,
    /// so a numeric string is not coerced into `publication_year`.
    pub fn from_payload(payload: &Value) -> Result<Self, ApiError> {
        let Some(object) = payload.as_object() else {
            return Err(ApiError::validation(vec![ApiError::field_detail(
                &["body"],
                "Input should be a valid object",
                "model_type",
            )]));
        };

        let mut detail = Vec::new();

        let title = required_string(object, "title", &mut detail);
        let author = required_string(object, "author", &mut detail);
        let publication_year = required_int(object, "publication_year", &mut detail);

        match (title, author, publication_year) {
            (Some(title), Some(author), Some(publication_year)) => Ok(Self {
                title,
                author,
                publication_year,
            }),
            _ => Err(ApiError::validation(detail)),
        }
    }
}

fn required_string(
    object: &serde_json::Map<String, Value>,
    field: &str,
    detail: &mut Vec<Value>,
) -> Option<String> {
    match object.get(field) {
        None => {
            detail.push(ApiError::field_detail(
                &["body", field],
                "Field required",
                "missing",
            ));
            None
        }
        Some(value) => match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                detail.push(ApiError::field_detail(
                    &["body", field],
                    "Input should be a valid string",
                    "string_type",
                ));
                None
            }
        },
    }
}

fn required_int(
    object: &serde_json::Map<String, Value>,
    field: &str,
    detail: &mut Vec<Value>,
) -> Option<i64> {
    match object.get(field) {
        None => {
            detail.push(ApiError::field_detail(
                &["body", field],
                "Field required",
                "missing",
            ));
            None
        }
        Some(value) => match value.as_i64() {
            Some(n) => Some(n),
            None => {
                detail.push(ApiError::field_detail(
                    &["body", field],
                    "Input should be a valid integer",
                    "int_type",
                ));
                None
            }
        },
    }
}
