//! List response pagination envelope.

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::DecodeError;

/// Query parameter carrying the list offset.
pub const OFFSET_KEY: &str = "offset";
/// Query parameter carrying the list limit.
pub const LIMIT_KEY: &str = "limit";
/// Envelope member holding the pagination object.
pub const META_KEY: &str = "meta";
/// Envelope member holding the result array.
pub const RESULTS_KEY: &str = "results";

/// Names of the pagination members inside `meta`.
///
/// Backends that rename the members get their own keys per resource; the
/// defaults match Django REST framework's limit/offset envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationKeys {
    /// Page size member.
    pub limit: String,
    /// Offset member.
    pub offset: String,
    /// Total count member.
    pub total_count: String,
    /// Next page URL member.
    pub next: String,
    /// Previous page URL member.
    pub previous: String,
}

impl Default for PaginationKeys {
    fn default() -> Self {
        Self {
            limit: LIMIT_KEY.to_owned(),
            offset: OFFSET_KEY.to_owned(),
            total_count: "total_count".to_owned(),
            next: "next".to_owned(),
            previous: "previous".to_owned(),
        }
    }
}

/// Pagination of one list response, passed through from the backend as-is.
///
/// # Examples
///
/// ```
/// use drf_consumer::node::{Pagination, PaginationKeys};
///
/// let meta = serde_json::json!({
///     "limit": 200,
///     "offset": 0,
///     "total_count": 1234,
///     "next": "https://api.example.com/users/?limit=200&offset=200",
///     "previous": null
/// });
///
/// let pagination = Pagination::from_json(&meta, &PaginationKeys::default()).unwrap();
/// assert_eq!(pagination.limit, 200);
/// assert!(pagination.next.is_some());
/// assert!(pagination.previous.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Page size the backend applied.
    pub limit: u64,
    /// Offset of the first result.
    pub offset: u64,
    /// Total number of objects matching the request.
    pub total_count: u64,
    /// Next page, if any.
    pub next: Option<Url>,
    /// Previous page, if any.
    pub previous: Option<Url>,
}

impl Pagination {
    /// Reads pagination from the `meta` object of a list response.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if `json` is not an object, if `limit`, `offset`,
    /// or `total_count` is missing or not an unsigned integer, or if `next` or
    /// `previous` is neither null nor a valid URL.
    pub fn from_json(json: &Value, keys: &PaginationKeys) -> Result<Self, DecodeError> {
        if !json.is_object() {
            return Err(DecodeError::WrongType { field: META_KEY.to_owned(), expected: "object" });
        }

        Ok(Self {
            limit: required_uint(json, &keys.limit)?,
            offset: required_uint(json, &keys.offset)?,
            total_count: required_uint(json, &keys.total_count)?,
            next: optional_url(json, &keys.next)?,
            previous: optional_url(json, &keys.previous)?,
        })
    }

    /// Returns true if the backend reported a next page.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

fn field_path(key: &str) -> String {
    format!("{META_KEY}.{key}")
}

fn required_uint(json: &Value, key: &str) -> Result<u64, DecodeError> {
    let value = json.get(key).ok_or_else(|| DecodeError::MissingField(field_path(key)))?;
    value.as_u64().ok_or_else(|| DecodeError::WrongType { field: field_path(key), expected: "uint" })
}

fn optional_url(json: &Value, key: &str) -> Result<Option<Url>, DecodeError> {
    match json.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Url::parse(raw)
            .map(Some)
            .map_err(|e| DecodeError::InvalidUrl { field: field_path(key), reason: e.to_string() }),
        Some(_) => Err(DecodeError::WrongType { field: field_path(key), expected: "url string" }),
    }
}
