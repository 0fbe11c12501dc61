//! Routes: where on the backend each resource lives.

use std::{collections::HashMap, fmt};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;

use crate::{
    error::{ConsumerError, Result},
    resource::{DetailGettable, ListGettable, SinglePostable},
};

/// Placeholder replaced by the resource id in detail routes.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Bytes left as-is in an id segment: RFC 3986 unreserved characters.
const ID_SEGMENT: &AsciiSet =
    &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// HTTP method of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    #[serde(alias = "get")]
    Get,
    /// `POST`
    #[serde(alias = "post")]
    Post,
    /// `PUT`
    #[serde(alias = "put")]
    Put,
    /// `PATCH`
    #[serde(alias = "patch")]
    Patch,
    /// `DELETE`
    #[serde(alias = "delete")]
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a route addresses a collection or a single object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Collection endpoint, e.g. `users/`.
    List,
    /// Single-object endpoint, e.g. `users/{id}/`.
    Detail,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Detail => f.write_str("detail"),
        }
    }
}

/// Binds a resource, route kind, and method to a path relative to the node's
/// base URL.
///
/// # Examples
///
/// ```
/// use drf_consumer::node::{HttpMethod, Route, RouteKind};
///
/// let route = Route::new("users", RouteKind::Detail, HttpMethod::Get, "users/{id}/").unwrap();
/// assert_eq!(route.resolve(Some("42")).unwrap(), "users/42/");
///
/// assert!(Route::new("users", RouteKind::List, HttpMethod::Get, "../admin/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    resource: String,
    kind: RouteKind,
    method: HttpMethod,
    relative_url: String,
}

impl Route {
    /// Creates a route after validating its relative path.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::InvalidRoute`] if the path is absolute, carries a
    /// scheme, query, or fragment, or contains `..` or `//`.
    pub fn new(
        resource: impl Into<String>,
        kind: RouteKind,
        method: HttpMethod,
        relative_url: impl Into<String>,
    ) -> Result<Self> {
        let resource = resource.into();
        let relative_url = relative_url.into();
        validate_relative_path(&resource, &relative_url)?;
        Ok(Self { resource, kind, method, relative_url })
    }

    /// List GET route for `T`.
    ///
    /// # Errors
    ///
    /// See [`Route::new`].
    pub fn list_get<T: ListGettable>(relative_url: impl Into<String>) -> Result<Self> {
        Self::new(T::RESOURCE_NAME, RouteKind::List, HttpMethod::Get, relative_url)
    }

    /// Detail GET route for `T`.
    ///
    /// # Errors
    ///
    /// See [`Route::new`].
    pub fn detail_get<T: DetailGettable>(relative_url: impl Into<String>) -> Result<Self> {
        Self::new(T::RESOURCE_NAME, RouteKind::Detail, HttpMethod::Get, relative_url)
    }

    /// Single POST route for `T`.
    ///
    /// # Errors
    ///
    /// See [`Route::new`].
    pub fn single_post<T: SinglePostable>(relative_url: impl Into<String>) -> Result<Self> {
        Self::new(T::RESOURCE_NAME, RouteKind::Detail, HttpMethod::Post, relative_url)
    }

    /// Resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Route kind.
    #[must_use]
    pub const fn kind(&self) -> RouteKind {
        self.kind
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Relative path as registered, placeholder included.
    #[must_use]
    pub fn relative_url(&self) -> &str {
        &self.relative_url
    }

    /// Returns true if the path contains [`ID_PLACEHOLDER`].
    #[must_use]
    pub fn needs_id(&self) -> bool {
        self.relative_url.contains(ID_PLACEHOLDER)
    }

    /// Relative path with the id filled in.
    ///
    /// With a placeholder, `id` replaces it. Without one, a given `id` is
    /// appended as a final path segment, matching Django REST framework's
    /// `<collection>/<id>/` layout. The id is percent-encoded as a single
    /// segment, so it can never introduce a separator or a dot-segment.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::InvalidInput`] if `id` is empty or contains `/`,
    /// `?`, or `#`, and [`ConsumerError::InvalidRoute`] if the path needs an id
    /// and none was given.
    pub fn resolve(&self, id: Option<&str>) -> Result<String> {
        let Some(id) = id else {
            if self.needs_id() {
                return Err(ConsumerError::InvalidRoute(format!(
                    "route '{}' for '{}' needs an id",
                    self.relative_url, self.resource
                )));
            }
            return Ok(self.relative_url.clone());
        };

        validate_id(id)?;
        let id = utf8_percent_encode(id, ID_SEGMENT).to_string();
        if self.needs_id() {
            return Ok(self.relative_url.replace(ID_PLACEHOLDER, &id));
        }

        let mut path = self.relative_url.clone();
        if !path.is_empty() && !path.ends_with('/') {
            path.push('/');
        }
        path.push_str(&id);
        path.push('/');
        Ok(path)
    }
}

/// Validates a relative route path.
pub(crate) fn validate_relative_path(resource: &str, path: &str) -> Result<()> {
    if path.contains("..") {
        return Err(ConsumerError::InvalidRoute(format!(
            "route for '{resource}' contains path traversal sequence '..': {path}"
        )));
    }

    if path.contains("//") {
        return Err(ConsumerError::InvalidRoute(format!(
            "route for '{resource}' contains double slash '//': {path}"
        )));
    }

    if path.starts_with('/') {
        return Err(ConsumerError::InvalidRoute(format!(
            "route for '{resource}' must be relative to the base URL: {path}"
        )));
    }

    if url::Url::parse(path).is_ok() {
        return Err(ConsumerError::InvalidRoute(format!(
            "route for '{resource}' must not carry a scheme: {path}"
        )));
    }

    if path.contains('?') || path.contains('#') {
        return Err(ConsumerError::InvalidRoute(format!(
            "route for '{resource}' must not contain a query or fragment: {path}"
        )));
    }

    Ok(())
}

fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(ConsumerError::InvalidInput("resource id is empty".to_owned()));
    }
    if id == "." || id == ".." {
        return Err(ConsumerError::InvalidInput(format!("resource id is a dot segment: {id}")));
    }
    if let Some(ch) = id.chars().find(|c| matches!(c, '/' | '?' | '#')) {
        return Err(ConsumerError::InvalidInput(format!(
            "resource id contains reserved character '{ch}': {id}"
        )));
    }
    Ok(())
}

/// Routes of one node, unique per resource, kind, and method.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: HashMap<(String, RouteKind, HttpMethod), Route>,
}

impl RouteRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `route`, returning the route it replaced.
    pub fn insert(&mut self, route: Route) -> Option<Route> {
        let key = (route.resource.clone(), route.kind, route.method);
        self.routes.insert(key, route)
    }

    /// Route for `resource`, `kind`, and `method`.
    #[must_use]
    pub fn find(&self, resource: &str, kind: RouteKind, method: HttpMethod) -> Option<&Route> {
        self.routes.get(&(resource.to_owned(), kind, method))
    }

    /// Iterates all routes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<Route> for RouteRegistry {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        let mut registry = Self::new();
        for route in iter {
            registry.insert(route);
        }
        registry
    }
}
