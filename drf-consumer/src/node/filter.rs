//! Django-style list filters.

use std::fmt;

use serde::Deserialize;

use crate::payload::{JsonValue, ToJsonValue};

/// Field lookup appended to a filter's field name with `__`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// Exact match. Adds no suffix.
    Exact,
    /// Case-insensitive exact match.
    IExact,
    /// Substring match.
    Contains,
    /// Case-insensitive substring match.
    IContains,
    /// Membership in a list.
    In,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Prefix match.
    StartsWith,
    /// Case-insensitive prefix match.
    IStartsWith,
    /// Suffix match.
    EndsWith,
    /// Case-insensitive suffix match.
    IEndsWith,
    /// Inclusive range, value is a two-element list.
    Range,
    /// Null check, value is a boolean.
    IsNull,
}

impl Comparator {
    /// Lookup name without the leading `__`, empty for [`Comparator::Exact`].
    #[must_use]
    pub const fn lookup(self) -> &'static str {
        match self {
            Self::Exact => "",
            Self::IExact => "iexact",
            Self::Contains => "contains",
            Self::IContains => "icontains",
            Self::In => "in",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::StartsWith => "startswith",
            Self::IStartsWith => "istartswith",
            Self::EndsWith => "endswith",
            Self::IEndsWith => "iendswith",
            Self::Range => "range",
            Self::IsNull => "isnull",
        }
    }
}

/// One list filter: a query key such as `name__icontains` and its value.
///
/// # Examples
///
/// ```
/// use drf_consumer::node::{Comparator, Filter};
///
/// let filter = Filter::new("name", Comparator::IContains, "jan");
/// assert_eq!(filter.string_key(), "name__icontains");
///
/// let exact = Filter::new("id", Comparator::Exact, 42u32);
/// assert_eq!(exact.string_key(), "id");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    string_key: String,
    value: JsonValue,
}

impl Filter {
    /// Builds the key from `field` and `comparator`.
    #[must_use]
    pub fn new(field: &str, comparator: Comparator, value: impl ToJsonValue) -> Self {
        let string_key = match comparator.lookup() {
            "" => field.to_owned(),
            lookup => format!("{field}__{lookup}"),
        };
        Self { string_key, value: value.to_json_value() }
    }

    /// Uses `key` verbatim, for lookups spanning relations such as
    /// `owner__name__iexact`.
    #[must_use]
    pub fn raw(key: impl Into<String>, value: impl ToJsonValue) -> Self {
        Self { string_key: key.into(), value: value.to_json_value() }
    }

    /// Query parameter key.
    #[must_use]
    pub fn string_key(&self) -> &str {
        &self.string_key
    }

    /// Filter value.
    #[must_use]
    pub const fn value(&self) -> &JsonValue {
        &self.value
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.string_key, self.value.to_query_value())
    }
}
