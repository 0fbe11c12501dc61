//! Typed JSON values.
//!
//! [`JsonValue`] is the closed set of values a payload field can render to.
//! [`JsonValue::to_wire`] unwraps it into a bare [`serde_json::Value`] tree ready
//! for serialization.
//!
//! Null and "absent" are different things: a field rendered as
//! [`JsonValue::Null`] is sent as `null`, while a field that is never handed to
//! the merge engine is omitted from the body. Producers decide which one they
//! want per field.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Number, Value};

/// A typed JSON value.
///
/// Equality is structural: objects compare by key set and per-key value
/// regardless of insertion order, arrays compare positionally.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use drf_consumer::payload::JsonValue;
///
/// let a = JsonValue::object([("name", JsonValue::from("Jan")), ("age", JsonValue::from(30u8))]);
/// let b = JsonValue::object([("age", JsonValue::from(30u8)), ("name", JsonValue::from("Jan"))]);
/// assert_eq!(a, b);
/// assert_eq!(a.to_wire(), serde_json::json!({"name": "Jan", "age": 30}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    /// Boolean.
    Bool(bool),
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width.
    UInt(u64),
    /// Single-precision float.
    Float(f32),
    /// Double-precision float.
    Double(f64),
    /// String.
    String(String),
    /// Ordered array.
    Array(Vec<JsonValue>),
    /// Object with unique keys.
    Object(BTreeMap<String, JsonValue>),
    /// Explicit null.
    Null,
}

impl JsonValue {
    /// Builds an object from key/value pairs. Later duplicates overwrite earlier ones.
    #[must_use]
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, JsonValue)>,
    {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns true for [`JsonValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Unwraps the typed tree into a bare [`serde_json::Value`].
    ///
    /// Non-finite floats have no JSON representation and unwrap to `null`.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number((*i).into()),
            Self::UInt(u) => Value::Number((*u).into()),
            Self::Float(f) => Number::from_f64(f64::from(*f)).map_or(Value::Null, Value::Number),
            Self::Double(d) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_wire).collect()),
            Self::Object(map) => {
                Value::Object(map.iter().map(|(k, v)| (k.clone(), v.to_wire())).collect())
            }
            Self::Null => Value::Null,
        }
    }

    /// Converts a bare [`serde_json::Value`] into the typed tree.
    ///
    /// Numbers become [`JsonValue::UInt`] when non-negative integers,
    /// [`JsonValue::Int`] when negative integers, and [`JsonValue::Double`] otherwise.
    #[must_use]
    pub fn from_wire(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    n.as_f64().map_or(Self::Null, Self::Double)
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_wire).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from_wire(v))).collect())
            }
        }
    }

    /// Renders the value as a single query-string parameter value.
    ///
    /// Arrays are joined with `,`, the form Django filter lookups such as `__in` expect.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Double(d) => d.to_string(),
            Self::String(s) => s.clone(),
            Self::Array(items) => {
                items.iter().map(Self::to_query_value).collect::<Vec<_>>().join(",")
            }
            Self::Object(_) => self.to_wire().to_string(),
            Self::Null => String::new(),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        value.to_wire()
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        Self::from_wire(value)
    }
}

/// Converts a value into a [`JsonValue`].
///
/// Implemented for the scalar types, strings, options, sequences, and string-keyed
/// maps. Domain types implement it to control how they render as a JSON field.
pub trait ToJsonValue {
    /// Renders `self` as a typed JSON value.
    fn to_json_value(&self) -> JsonValue;
}

impl ToJsonValue for JsonValue {
    fn to_json_value(&self) -> JsonValue {
        self.clone()
    }
}

impl ToJsonValue for Value {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::from_wire(self.clone())
    }
}

impl ToJsonValue for bool {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Bool(*self)
    }
}

macro_rules! impl_signed {
    ($($t:ty),*) => {$(
        impl ToJsonValue for $t {
            fn to_json_value(&self) -> JsonValue {
                JsonValue::Int(i64::from(*self))
            }
        }

        impl From<$t> for JsonValue {
            fn from(value: $t) -> Self {
                Self::Int(i64::from(value))
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($t:ty),*) => {$(
        impl ToJsonValue for $t {
            fn to_json_value(&self) -> JsonValue {
                JsonValue::UInt(u64::from(*self))
            }
        }

        impl From<$t> for JsonValue {
            fn from(value: $t) -> Self {
                Self::UInt(u64::from(value))
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64);
impl_unsigned!(u8, u16, u32, u64);

impl ToJsonValue for isize {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Int(*self as i64)
    }
}

impl ToJsonValue for usize {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::UInt(*self as u64)
    }
}

impl From<usize> for JsonValue {
    fn from(value: usize) -> Self {
        Self::UInt(value as u64)
    }
}

impl ToJsonValue for f32 {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Float(*self)
    }
}

impl ToJsonValue for f64 {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Double(*self)
    }
}

impl From<f32> for JsonValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for JsonValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<bool> for JsonValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl ToJsonValue for str {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(self.to_owned())
    }
}

impl ToJsonValue for String {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::String(self.clone())
    }
}

impl From<&str> for JsonValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for JsonValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: ToJsonValue> ToJsonValue for Option<T> {
    fn to_json_value(&self) -> JsonValue {
        self.as_ref().map_or(JsonValue::Null, ToJsonValue::to_json_value)
    }
}

impl<T: ToJsonValue> ToJsonValue for [T] {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Array(self.iter().map(ToJsonValue::to_json_value).collect())
    }
}

impl<T: ToJsonValue> ToJsonValue for Vec<T> {
    fn to_json_value(&self) -> JsonValue {
        self.as_slice().to_json_value()
    }
}

impl<T: ToJsonValue> ToJsonValue for BTreeMap<String, T> {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Object(self.iter().map(|(k, v)| (k.clone(), v.to_json_value())).collect())
    }
}

impl<T: ToJsonValue, S> ToJsonValue for HashMap<String, T, S> {
    fn to_json_value(&self) -> JsonValue {
        JsonValue::Object(self.iter().map(|(k, v)| (k.clone(), v.to_json_value())).collect())
    }
}

impl<T: ToJsonValue + ?Sized> ToJsonValue for &T {
    fn to_json_value(&self) -> JsonValue {
        (**self).to_json_value()
    }
}

/// Unwrapped JSON body: the bare map a JSON-encoded request body serializes from.
pub type UnwrappedJson = Map<String, Value>;
