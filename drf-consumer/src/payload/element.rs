//! Payload elements: the tagged values the merge engine walks.

use std::collections::{BTreeMap, HashMap};

use crate::{
    node::HttpMethod,
    payload::{JsonValue, MultipartValue, Payload, PayloadConversion, ToJsonValue},
};

/// How one named field contributes to a [`Payload`].
///
/// - [`Json`](Self::Json) renders as a JSON entry at the field's key path
/// - [`Multipart`](Self::Multipart) renders as a binary part named after the key path
/// - [`Nested`](Self::Nested) recurses, extending the key path by each child's key
/// - [`List`](Self::List) recurses, extending the key path by each child's index
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A JSON value.
    Json(JsonValue),
    /// A binary part.
    Multipart(MultipartValue),
    /// A sub-map whose children merge under this key.
    Nested(PayloadDict),
    /// A sequence whose children merge under indexed paths.
    List(Vec<Element>),
}

impl Element {
    /// JSON element from anything convertible to [`JsonValue`].
    #[must_use]
    pub fn json(value: &(impl ToJsonValue + ?Sized)) -> Self {
        Self::Json(value.to_json_value())
    }

    /// Explicit JSON null. The key is kept and sent as `null`.
    #[must_use]
    pub const fn null() -> Self {
        Self::Json(JsonValue::Null)
    }

    /// Returns true if this element, or any element below it, is a binary part.
    #[must_use]
    pub fn contains_multipart(&self) -> bool {
        match self {
            Self::Json(_) => false,
            Self::Multipart(_) => true,
            Self::Nested(dict) => dict.values().any(Self::contains_multipart),
            Self::List(items) => items.iter().any(Self::contains_multipart),
        }
    }
}

impl From<JsonValue> for Element {
    fn from(value: JsonValue) -> Self {
        Self::Json(value)
    }
}

impl From<MultipartValue> for Element {
    fn from(value: MultipartValue) -> Self {
        Self::Multipart(value)
    }
}

impl From<PayloadDict> for Element {
    fn from(value: PayloadDict) -> Self {
        Self::Nested(value)
    }
}

/// Ordered mapping of field names to [`Element`]s.
///
/// Inserting an existing key replaces its element in place, so building a dict
/// from a list with duplicate keys keeps the last value.
///
/// # Examples
///
/// ```
/// use drf_consumer::payload::{ContentType, Element, MultipartValue, PayloadDict};
///
/// let dict = PayloadDict::new()
///     .with("name", "Jan")
///     .with("avatar", MultipartValue::new(vec![0xff, 0xd8], ContentType::ImageJpeg))
///     .with("address", PayloadDict::new().with("city", "Berlin"));
///
/// assert_eq!(dict.len(), 3);
/// assert!(dict.get("avatar").is_some_and(Element::contains_multipart));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PayloadDict {
    entries: Vec<(String, Element)>,
}

impl PayloadDict {
    /// Creates an empty dict.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Inserts `value` under `key`, returning the element it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Elementable) -> Option<Element> {
        let key = key.into();
        let element = value.to_element();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, element));
        }
        self.entries.push((key, element));
        None
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Elementable) -> Self {
        self.insert(key, value);
        self
    }

    /// Removes and returns the element under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Element> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Element stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Element> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dict has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Element)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates elements in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Element> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl PartialEq for PayloadDict {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<String>> FromIterator<(K, Element)> for PayloadDict {
    fn from_iter<I: IntoIterator<Item = (K, Element)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (key, element) in iter {
            dict.insert(key, element);
        }
        dict
    }
}

impl<'a> IntoIterator for &'a PayloadDict {
    type Item = (&'a str, &'a Element);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Element)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// A value able to contribute to a [`Payload`].
pub trait Elementable {
    /// Renders `self` as an [`Element`].
    fn to_element(&self) -> Element;
}

impl Elementable for Element {
    fn to_element(&self) -> Element {
        self.clone()
    }
}

impl Elementable for JsonValue {
    fn to_element(&self) -> Element {
        Element::Json(self.clone())
    }
}

impl Elementable for serde_json::Value {
    fn to_element(&self) -> Element {
        Element::json(self)
    }
}

impl Elementable for MultipartValue {
    fn to_element(&self) -> Element {
        Element::Multipart(self.clone())
    }
}

impl Elementable for PayloadDict {
    fn to_element(&self) -> Element {
        Element::Nested(self.clone())
    }
}

macro_rules! impl_elementable_json {
    ($($t:ty),*) => {$(
        impl Elementable for $t {
            fn to_element(&self) -> Element {
                Element::Json(self.to_json_value())
            }
        }
    )*};
}

impl_elementable_json!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, str, String
);

impl<T: Elementable> Elementable for Option<T> {
    fn to_element(&self) -> Element {
        self.as_ref().map_or(Element::null(), Elementable::to_element)
    }
}

impl<T: Elementable> Elementable for [T] {
    fn to_element(&self) -> Element {
        Element::List(self.iter().map(Elementable::to_element).collect())
    }
}

impl<T: Elementable> Elementable for Vec<T> {
    fn to_element(&self) -> Element {
        self.as_slice().to_element()
    }
}

impl<T: Elementable> Elementable for BTreeMap<String, T> {
    fn to_element(&self) -> Element {
        Element::Nested(self.iter().map(|(k, v)| (k.clone(), v.to_element())).collect())
    }
}

impl<T: Elementable, S> Elementable for HashMap<String, T, S> {
    fn to_element(&self) -> Element {
        let mut entries: Vec<(&String, &T)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        Element::Nested(entries.into_iter().map(|(k, v)| (k.clone(), v.to_element())).collect())
    }
}

impl<T: Elementable + ?Sized> Elementable for &T {
    fn to_element(&self) -> Element {
        (**self).to_element()
    }
}

/// A domain type that renders itself as a request payload.
///
/// Implementors list their fields once in [`payload_dict`](Self::payload_dict);
/// the conversion passed to [`to_payload`](Self::to_payload) decides per request
/// how those fields land on the wire.
pub trait PayloadConvertible {
    /// Named fields of this object for a request with `method`.
    fn payload_dict(&self, method: HttpMethod) -> PayloadDict;

    /// Renders this object into a fresh [`Payload`].
    fn to_payload(&self, conversion: &dyn PayloadConversion, method: HttpMethod) -> Payload {
        Payload::from_dict(self.payload_dict(method), conversion, method)
    }
}
