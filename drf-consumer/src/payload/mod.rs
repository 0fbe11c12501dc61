//! Request payloads.
//!
//! A [`Payload`] accumulates the fields of one outgoing request body in two
//! maps: a JSON map and a map of binary multipart parts keyed by [`KeyPath`].
//! Fields are merged in from [`PayloadDict`]s, walked recursively, and routed to
//! one map or the other by their [`Element`] variant after an optional
//! [`PayloadConversion`] has had a chance to replace them.
//!
//! # Examples
//!
//! ```
//! use drf_consumer::node::HttpMethod;
//! use drf_consumer::payload::{
//!     ContentType, DefaultConversion, KeyPath, MultipartValue, Payload, PayloadDict,
//! };
//!
//! let dict = PayloadDict::new()
//!     .with("name", "Jan")
//!     .with("address", PayloadDict::new().with("city", "Berlin"))
//!     .with("avatar", MultipartValue::new(vec![0x89, 0x50], ContentType::ImagePng));
//!
//! let payload = Payload::from_dict(dict, &DefaultConversion, HttpMethod::Post);
//!
//! assert_eq!(
//!     serde_json::Value::Object(payload.json().clone()),
//!     serde_json::json!({"name": "Jan", "address": {"city": "Berlin"}})
//! );
//! assert!(payload.multipart().contains_key(&KeyPath::new("avatar")));
//! assert!(payload.is_multipart());
//! ```

mod conversion;
mod element;
mod multipart;
mod path;
mod value;

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

pub use conversion::{ConversionContext, DefaultConversion, PayloadConversion, Rendering};
pub use element::{Element, Elementable, PayloadConvertible, PayloadDict};
pub use multipart::{ContentType, MULTIPART_JSON_KEY, MultipartValue, envelope};
pub use path::{KeyPath, PathElement};
use serde_json::{Map, Value};
pub use value::{JsonValue, ToJsonValue, UnwrappedJson};

use crate::{
    error::{ConsumerError, Result},
    node::HttpMethod,
};

/// Accumulated body of one outgoing request.
///
/// Every leaf lands in exactly one of the two maps: binary parts in the
/// multipart map under their key path, everything else in the JSON map.
/// Merging a dict that touches a top-level field drops everything previously
/// stored under that field, in both maps, before the new contribution is
/// written.
#[derive(Debug, Clone)]
pub struct Payload {
    method: HttpMethod,
    origin: Option<Arc<PayloadDict>>,
    json: UnwrappedJson,
    multipart: BTreeMap<KeyPath, MultipartValue>,
}

impl Payload {
    /// Creates an empty payload for a request with `method`.
    #[must_use]
    pub fn new(method: HttpMethod) -> Self {
        Self { method, origin: None, json: Map::new(), multipart: BTreeMap::new() }
    }

    /// Renders `dict` into a fresh payload.
    ///
    /// `dict` is kept as the payload's origin and exposed to conversions of
    /// later merges through [`ConversionContext::object`].
    #[must_use]
    pub fn from_dict(dict: PayloadDict, conversion: &dyn PayloadConversion, method: HttpMethod) -> Self {
        let mut payload = Self::new(method);
        payload.origin = Some(Arc::new(dict));
        if let Some(origin) = payload.origin.clone() {
            payload.merge(&origin, conversion);
        }
        payload
    }

    /// Method this payload is built for.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Dict the payload was created from.
    #[must_use]
    pub fn origin(&self) -> Option<&PayloadDict> {
        self.origin.as_deref()
    }

    /// JSON fields.
    #[must_use]
    pub const fn json(&self) -> &UnwrappedJson {
        &self.json
    }

    /// Binary parts by key path.
    #[must_use]
    pub const fn multipart(&self) -> &BTreeMap<KeyPath, MultipartValue> {
        &self.multipart
    }

    /// Returns true if any binary part is present.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.multipart.is_empty()
    }

    /// Returns true if neither map holds anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.json.is_empty() && self.multipart.is_empty()
    }

    /// Merges `dict` into this payload.
    ///
    /// Each top-level key of `dict` overwrites whatever the payload held under
    /// that key, so merging the same dict twice is the same as merging it once.
    pub fn merge(&mut self, dict: &PayloadDict, conversion: &dyn PayloadConversion) {
        let mut rendered = Rendered::default();
        let object = self.origin.as_deref();
        for (key, element) in dict {
            rendered.visit(KeyPath::new(key), element, conversion, self.method, object);
        }

        let touched: BTreeSet<&str> = dict.keys().collect();
        for head in &touched {
            self.json.remove(*head);
        }
        self.multipart.retain(|path, _| !touched.contains(path.head()));

        self.json.extend(rendered.json);
        self.multipart.extend(rendered.multipart);
    }

    /// Non-mutating [`merge`](Self::merge).
    #[must_use]
    pub fn merging(&self, dict: &PayloadDict, conversion: &dyn PayloadConversion) -> Self {
        let mut merged = self.clone();
        merged.merge(dict, conversion);
        merged
    }

    /// JSON map serialized as bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::SerializationError`] if serde rejects the map.
    pub fn json_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.json).map_err(|e| ConsumerError::SerializationError(e.to_string()))
    }

    /// Parts of the multipart envelope in send order.
    ///
    /// The JSON map travels first as one `application/json` part named
    /// [`MULTIPART_JSON_KEY`], followed by one part per binary field named by
    /// its key path. The JSON part is omitted when the JSON map is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::SerializationError`] if a binary field is named
    /// [`MULTIPART_JSON_KEY`] while JSON fields are present, or if the JSON map
    /// cannot be serialized.
    pub fn multipart_parts(&self) -> Result<Vec<(String, MultipartValue)>> {
        multipart::envelope(
            &self.json,
            self.multipart.iter().map(|(path, value)| (path.to_string(), value.clone())),
        )
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.json == other.json && self.multipart == other.multipart
    }
}

#[derive(Default)]
struct Rendered {
    json: UnwrappedJson,
    multipart: BTreeMap<KeyPath, MultipartValue>,
}

impl Rendered {
    fn visit(
        &mut self,
        path: KeyPath,
        element: &Element,
        conversion: &dyn PayloadConversion,
        method: HttpMethod,
        object: Option<&PayloadDict>,
    ) {
        let ctx = ConversionContext::new(method, path, object);
        let replaced = conversion.convert(element, &ctx);
        let element = replaced.as_ref().unwrap_or(element);
        let path = ctx.path;

        match element {
            Element::Json(value) => insert_json(&mut self.json, &path, value.to_wire()),
            Element::Multipart(part) => {
                self.multipart.insert(path, part.clone());
            }
            Element::Nested(dict) => {
                if dict.is_empty() {
                    insert_json(&mut self.json, &path, Value::Object(Map::new()));
                }
                for (key, child) in dict {
                    self.visit(path.child(key), child, conversion, method, object);
                }
            }
            Element::List(items) => {
                if items.is_empty() {
                    insert_json(&mut self.json, &path, Value::Array(Vec::new()));
                }
                for (index, child) in items.iter().enumerate() {
                    self.visit(path.index(index), child, conversion, method, object);
                }
            }
        }
    }
}

/// Writes `value` at `path`, creating objects for keys and arrays for indexes.
/// Array holes are padded with `null`.
fn insert_json(root: &mut UnwrappedJson, path: &KeyPath, value: Value) {
    let slot = root.entry(path.head().to_owned()).or_insert(Value::Null);
    insert_below(slot, path.tail(), value);
}

fn insert_below(slot: &mut Value, tail: &[PathElement], value: Value) {
    let Some((step, rest)) = tail.split_first() else {
        *slot = value;
        return;
    };

    match step {
        PathElement::Key(key) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(map) = slot {
                insert_below(map.entry(key.clone()).or_insert(Value::Null), rest, value);
            }
        }
        PathElement::Index(index) => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            if let Value::Array(items) = slot {
                if items.len() <= *index {
                    items.resize(*index + 1, Value::Null);
                }
                insert_below(&mut items[*index], rest, value);
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/proptest_merge.rs"]
mod proptest_merge;
