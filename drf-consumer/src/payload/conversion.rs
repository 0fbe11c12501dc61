//! Pluggable conversion applied while a payload is rendered.

use crate::{
    node::HttpMethod,
    payload::{Element, KeyPath, PayloadDict},
};

/// Whether a conversion is looking at one of the object's own fields or at a
/// value nested somewhere below them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rendering {
    /// A top-level field of the object being rendered.
    Root,
    /// A value inside a nested map or list.
    Nested,
}

/// Where in the payload an element is being rendered.
#[derive(Debug, Clone)]
pub struct ConversionContext<'a> {
    /// Method of the request the payload is built for.
    pub method: HttpMethod,
    /// Full path of the element.
    pub path: KeyPath,
    /// Root or nested rendering.
    pub origin: Rendering,
    /// The dict the payload was first created from, if any.
    pub object: Option<&'a PayloadDict>,
}

impl<'a> ConversionContext<'a> {
    pub(crate) fn new(method: HttpMethod, path: KeyPath, object: Option<&'a PayloadDict>) -> Self {
        let origin = if path.depth() == 0 { Rendering::Root } else { Rendering::Nested };
        Self { method, path, origin, object }
    }
}

/// Intercepts elements before their default rendering.
///
/// Returning `Some` replaces the element at the current path; the replacement
/// is rendered as-is, and if it is a nested map or list its children are
/// offered to the conversion again.
///
/// Any `Fn(&Element, &ConversionContext) -> Option<Element>` closure is a
/// conversion.
///
/// # Examples
///
/// ```
/// use drf_consumer::node::HttpMethod;
/// use drf_consumer::payload::{ConversionContext, Element, Payload, PayloadDict};
///
/// // Send only the id of a nested author.
/// let by_id = |element: &Element, ctx: &ConversionContext<'_>| match element {
///     Element::Nested(dict) if ctx.path.head() == "author" && ctx.path.depth() == 0 => {
///         dict.get("id").cloned()
///     }
///     _ => None,
/// };
///
/// let dict = PayloadDict::new()
///     .with("title", "Hello")
///     .with("author", PayloadDict::new().with("id", 7u32).with("name", "Jan"));
///
/// let payload = Payload::from_dict(dict, &by_id, HttpMethod::Post);
/// assert_eq!(payload.json()["author"], serde_json::json!(7));
/// ```
pub trait PayloadConversion: Send + Sync {
    /// Replacement for `element` at `ctx.path`, or `None` to keep it.
    fn convert(&self, element: &Element, ctx: &ConversionContext<'_>) -> Option<Element>;
}

/// Conversion that never overrides anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConversion;

impl PayloadConversion for DefaultConversion {
    fn convert(&self, _element: &Element, _ctx: &ConversionContext<'_>) -> Option<Element> {
        None
    }
}

impl<F> PayloadConversion for F
where
    F: Fn(&Element, &ConversionContext<'_>) -> Option<Element> + Send + Sync,
{
    fn convert(&self, element: &Element, ctx: &ConversionContext<'_>) -> Option<Element> {
        self(element, ctx)
    }
}
