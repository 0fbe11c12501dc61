//! Addressing and dispatch context for backend requests.
//!
//! A [`Node`] is long-lived and shared: it holds the base URL, the transport,
//! the route table, per-resource defaults, and the observer registry. It keeps
//! no per-request state, so one node serves any number of concurrent requests.
//!
//! # Examples
//!
//! ```
//! use drf_consumer::{
//!     node::{Filter, Comparator, HttpMethod, Node, Route, RouteKind},
//!     transport::HttpTransport,
//! };
//!
//! let node = Node::builder("https://api.example.com/v1", HttpTransport::new().unwrap())
//!     .route(Route::new("users", RouteKind::List, HttpMethod::Get, "users/").unwrap())
//!     .default_limit_for("users", 200)
//!     .build()
//!     .unwrap();
//!
//! let url = node.absolute_url("users", RouteKind::List, HttpMethod::Get).unwrap();
//! assert_eq!(url.as_str(), "https://api.example.com/v1/users/");
//!
//! let filters = [Filter::new("name", Comparator::IContains, "blubb")];
//! let parameters = node.parameters_from(10, 100, &filters);
//! assert_eq!(parameters.len(), 3);
//! ```

mod config;
mod filter;
mod pagination;
mod route;

use std::{collections::HashMap, fmt, sync::Arc};

pub use config::{AuthConfig, FilterConfig, NodeConfig, ResourceConfig, RouteConfig};
pub use filter::{Comparator, Filter};
pub use pagination::{LIMIT_KEY, META_KEY, OFFSET_KEY, Pagination, PaginationKeys, RESULTS_KEY};
pub use route::{HttpMethod, ID_PLACEHOLDER, Route, RouteKind, RouteRegistry};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::{
    error::{ConsumerError, DecodeError, Result},
    payload::UnwrappedJson,
    resource::{ClientRegistry, FilteredListGettable, ListGettable, Resource},
    transport::{HttpTransport, RequestConfiguration, Transport},
};

/// Page size used when neither the request nor the resource settings name one.
pub const DEFAULT_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Default)]
struct ResourceSettings {
    default_limit: Option<u64>,
    default_filters: Vec<Filter>,
    pagination_keys: Option<PaginationKeys>,
}

/// Request context for one backend.
///
/// Header values are redacted from the [`Debug`] output.
pub struct Node<T: Transport> {
    base_url: Url,
    transport: T,
    routes: RouteRegistry,
    default_limit: u64,
    default_pagination_keys: PaginationKeys,
    resources: HashMap<String, ResourceSettings>,
    default_headers: Vec<(String, String)>,
    clients: Arc<ClientRegistry>,
}

impl<T: Transport> Node<T> {
    /// Starts building a node for `base_url`.
    ///
    /// The URL is parsed when the node is built.
    pub fn builder(base_url: impl Into<String>, transport: T) -> NodeBuilder<T> {
        NodeBuilder::new(base_url, transport)
    }

    /// Builds a node from a validated configuration.
    ///
    /// The auth header, if configured, is resolved from the environment once.
    ///
    /// # Errors
    ///
    /// Returns whatever [`NodeConfig::validate`] or
    /// [`AuthConfig::resolve`] returns.
    pub fn from_config(config: &NodeConfig, transport: T) -> Result<Self> {
        config.validate()?;

        let mut builder = NodeBuilder::new(config.base_url.clone(), transport)
            .default_limit(config.default_limit)
            .routes(config.route_registry()?.iter().cloned());

        if let Some(ref auth) = config.auth {
            let (name, value) = auth.resolve()?;
            builder = builder.default_header(name, value);
        }

        for (name, resource) in &config.resources {
            if let Some(limit) = resource.default_limit {
                builder = builder.default_limit_for(name.clone(), limit);
            }
            builder = builder
                .default_filters_for(name.clone(), resource.filters())
                .pagination_keys_for(name.clone(), resource.pagination.clone());
        }

        builder.build()
    }

    /// Base URL, always ending in `/`.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Transport requests are sent through.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Route table.
    #[must_use]
    pub const fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    /// Observer registry shared by every request of this node.
    #[must_use]
    pub const fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    /// Absolute URL of the route for `resource`, `kind`, and `method`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::UnknownRoute`] if no such route is registered,
    /// [`ConsumerError::InvalidRoute`] if the route needs an id, and
    /// [`ConsumerError::InvalidUrl`] if joining fails.
    pub fn absolute_url(
        &self,
        resource: &'static str,
        kind: RouteKind,
        method: HttpMethod,
    ) -> Result<Url> {
        let relative = self.route(resource, kind, method)?.resolve(None)?;
        self.join(&relative)
    }

    /// Absolute URL of the detail route for `resource` and `method`, with `id`
    /// filled in.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::UnknownRoute`] if no such route is registered,
    /// [`ConsumerError::InvalidInput`] if `id` is unusable, and
    /// [`ConsumerError::InvalidUrl`] if joining fails.
    pub fn absolute_detail_url(
        &self,
        resource: &'static str,
        method: HttpMethod,
        id: &str,
    ) -> Result<Url> {
        let relative = self.route(resource, RouteKind::Detail, method)?.resolve(Some(id))?;
        self.join(&relative)
    }

    /// Query parameters for one list page: `offset`, `limit`, then one entry
    /// per filter.
    ///
    /// A filter reusing `offset` or `limit` as its key overwrites the page
    /// value; filters are not expected to do so.
    #[must_use]
    pub fn parameters_from(&self, offset: u64, limit: u64, filters: &[Filter]) -> UnwrappedJson {
        let mut parameters = self.parameters_from_page(offset, limit);
        parameters.extend(self.parameters_from_filters(filters));
        parameters
    }

    /// Query parameters `offset` and `limit`.
    #[must_use]
    pub fn parameters_from_page(&self, offset: u64, limit: u64) -> UnwrappedJson {
        let mut parameters = UnwrappedJson::new();
        parameters.insert(OFFSET_KEY.to_owned(), Value::from(offset));
        parameters.insert(LIMIT_KEY.to_owned(), Value::from(limit));
        parameters
    }

    /// One query parameter per filter, later filters winning on equal keys.
    #[must_use]
    pub fn parameters_from_filters(&self, filters: &[Filter]) -> UnwrappedJson {
        filters.iter().map(|f| (f.string_key().to_owned(), f.value().to_wire())).collect()
    }

    /// Page size for `resource` when a request asks for none.
    #[must_use]
    pub fn default_limit(&self, resource: &str) -> u64 {
        self.resources.get(resource).and_then(|s| s.default_limit).unwrap_or(self.default_limit)
    }

    /// Default filters of `resource`.
    #[must_use]
    pub fn default_filters(&self, resource: &str) -> &[Filter] {
        self.resources.get(resource).map(|s| s.default_filters.as_slice()).unwrap_or_default()
    }

    /// Default filters of the filtered list resource `R`.
    #[must_use]
    pub fn default_filters_for<R: FilteredListGettable>(&self) -> &[Filter] {
        self.default_filters(R::RESOURCE_NAME)
    }

    /// Pagination member names used when decoding lists of `resource`.
    #[must_use]
    pub fn pagination_keys(&self, resource: &str) -> &PaginationKeys {
        self.resources
            .get(resource)
            .and_then(|s| s.pagination_keys.as_ref())
            .unwrap_or(&self.default_pagination_keys)
    }

    /// Decodes a list envelope into its pagination and objects.
    ///
    /// Objects keep the order of the `results` array. A single undecodable
    /// result fails the whole response.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::Decode`] if the body is not an object, if
    /// `meta` or `results` is missing or mistyped, or if any result fails to
    /// decode as `R`.
    pub fn extract_list_response<R: ListGettable>(
        &self,
        json: &Value,
    ) -> Result<(Pagination, Vec<R>)> {
        if !json.is_object() {
            return Err(DecodeError::WrongType { field: "$".to_owned(), expected: "object" }.into());
        }

        let meta =
            json.get(META_KEY).ok_or_else(|| DecodeError::MissingField(META_KEY.to_owned()))?;
        let pagination = Pagination::from_json(meta, self.pagination_keys(R::RESOURCE_NAME))?;

        let results = json
            .get(RESULTS_KEY)
            .ok_or_else(|| DecodeError::MissingField(RESULTS_KEY.to_owned()))?
            .as_array()
            .ok_or_else(|| DecodeError::WrongType {
                field: RESULTS_KEY.to_owned(),
                expected: "array",
            })?;

        let objects = results
            .iter()
            .enumerate()
            .map(|(index, element)| {
                R::deserialize(element).map_err(|e| DecodeError::ListElement {
                    index,
                    resource: R::RESOURCE_NAME,
                    reason: e.to_string(),
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((pagination, objects))
    }

    /// Decodes one object of `R`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::Decode`] if `json` does not decode as `R`.
    pub fn extract_single_object<R: Resource + DeserializeOwned>(&self, json: Value) -> Result<R> {
        serde_json::from_value(json).map_err(|e| {
            DecodeError::Object { resource: R::RESOURCE_NAME, reason: e.to_string() }.into()
        })
    }

    /// Sends `cfg` with the node's default headers placed before its own.
    ///
    /// # Errors
    ///
    /// Returns whatever the transport returns.
    pub async fn fire_json_request(&self, mut cfg: RequestConfiguration) -> Result<Value> {
        if !self.default_headers.is_empty() {
            let own = std::mem::take(&mut cfg.headers);
            cfg.headers = self.default_headers.iter().cloned().chain(own).collect();
        }

        debug!(
            protocol = self.transport.protocol_name(),
            method = %cfg.method,
            url = %cfg.url,
            "firing request"
        );
        self.transport.fire_json_request(cfg).await
    }

    fn route(&self, resource: &'static str, kind: RouteKind, method: HttpMethod) -> Result<&Route> {
        self.routes
            .find(resource, kind, method)
            .ok_or(ConsumerError::UnknownRoute { resource, kind, method })
    }

    fn join(&self, relative: &str) -> Result<Url> {
        self.base_url
            .join(relative)
            .map_err(|e| ConsumerError::InvalidUrl(format!("cannot join '{relative}': {e}")))
    }
}

impl Node<HttpTransport> {
    /// Builds a node with an [`HttpTransport`] configured from `config.http`.
    ///
    /// # Errors
    ///
    /// Returns whatever [`HttpTransport::with_config`] or
    /// [`Node::from_config`] returns.
    pub fn from_http_config(config: &NodeConfig) -> Result<Self> {
        let transport = HttpTransport::with_config(&config.http)?;
        Self::from_config(config, transport)
    }
}

impl<T: Transport + fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<_> =
            self.default_headers.iter().map(|(name, _)| (name.as_str(), "<redacted>")).collect();
        f.debug_struct("Node")
            .field("base_url", &self.base_url.as_str())
            .field("transport", &self.transport)
            .field("routes", &self.routes.len())
            .field("default_limit", &self.default_limit)
            .field("default_headers", &headers)
            .field("clients", &self.clients)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Node`].
pub struct NodeBuilder<T: Transport> {
    base_url: String,
    transport: T,
    routes: RouteRegistry,
    default_limit: u64,
    resources: HashMap<String, ResourceSettings>,
    default_headers: Vec<(String, String)>,
    clients: Option<Arc<ClientRegistry>>,
}

impl<T: Transport> NodeBuilder<T> {
    /// Starts a builder with no routes and the default page size.
    pub fn new(base_url: impl Into<String>, transport: T) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            routes: RouteRegistry::new(),
            default_limit: DEFAULT_LIMIT,
            resources: HashMap::new(),
            default_headers: Vec::new(),
            clients: None,
        }
    }

    /// Registers a route, replacing any route with the same resource, kind, and method.
    #[must_use]
    pub fn route(mut self, route: Route) -> Self {
        self.routes.insert(route);
        self
    }

    /// Registers several routes.
    #[must_use]
    pub fn routes(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        for route in routes {
            self.routes.insert(route);
        }
        self
    }

    /// Sets the node-wide page size.
    #[must_use]
    pub const fn default_limit(mut self, limit: u64) -> Self {
        self.default_limit = limit;
        self
    }

    /// Sets the page size of one resource.
    #[must_use]
    pub fn default_limit_for(mut self, resource: impl Into<String>, limit: u64) -> Self {
        self.resources.entry(resource.into()).or_default().default_limit = Some(limit);
        self
    }

    /// Sets the default filters of one resource.
    #[must_use]
    pub fn default_filters_for(
        mut self,
        resource: impl Into<String>,
        filters: impl IntoIterator<Item = Filter>,
    ) -> Self {
        self.resources.entry(resource.into()).or_default().default_filters =
            filters.into_iter().collect();
        self
    }

    /// Sets the pagination member names of one resource.
    #[must_use]
    pub fn pagination_keys_for(mut self, resource: impl Into<String>, keys: PaginationKeys) -> Self {
        self.resources.entry(resource.into()).or_default().pagination_keys = Some(keys);
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Shares an existing observer registry instead of creating one.
    #[must_use]
    pub fn clients(mut self, clients: Arc<ClientRegistry>) -> Self {
        self.clients = Some(clients);
        self
    }

    /// Builds the node.
    ///
    /// The base URL gains a trailing `/` if it lacks one, so relative routes
    /// resolve below it.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::InvalidUrl`] if the base URL does not parse or
    /// cannot serve as a base, and [`ConsumerError::ConfigError`] if a page
    /// size is zero.
    pub fn build(self) -> Result<Node<T>> {
        let mut base_url = Url::parse(&self.base_url).map_err(|e| {
            ConsumerError::InvalidUrl(format!("invalid base URL '{}': {e}", self.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConsumerError::InvalidUrl(format!(
                "base URL cannot be a base: {}",
                self.base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        if self.default_limit == 0
            || self.resources.values().any(|s| s.default_limit == Some(0))
        {
            return Err(ConsumerError::ConfigError("default limit must be positive".to_owned()));
        }

        Ok(Node {
            base_url,
            transport: self.transport,
            routes: self.routes,
            default_limit: self.default_limit,
            default_pagination_keys: PaginationKeys::default(),
            resources: self.resources,
            default_headers: self.default_headers,
            clients: self.clients.unwrap_or_default(),
        })
    }
}

impl<T: Transport + fmt::Debug> fmt::Debug for NodeBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBuilder")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport)
            .field("routes", &self.routes.len())
            .field("default_limit", &self.default_limit)
            .field("default_headers", &self.default_headers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone)]
    struct NullTransport;

    impl Transport for NullTransport {
        async fn fire_json_request(&self, _cfg: RequestConfiguration) -> Result<Value> {
            Ok(Value::Null)
        }

        fn protocol_name(&self) -> &'static str {
            "null"
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u64,
        name: String,
    }

    impl Resource for User {
        const RESOURCE_NAME: &'static str = "users";
    }

    impl ListGettable for User {}

    fn node() -> Node<NullTransport> {
        Node::builder("https://api.example.com/v1", NullTransport)
            .route(Route::new("users", RouteKind::List, HttpMethod::Get, "users/").unwrap())
            .route(Route::new("users", RouteKind::Detail, HttpMethod::Get, "users/{id}/").unwrap())
            .route(Route::new("users", RouteKind::Detail, HttpMethod::Post, "users/").unwrap())
            .build()
            .unwrap()
    }

    fn envelope(results: Value) -> Value {
        json!({
            "meta": {"limit": 100, "offset": 0, "total_count": 250, "next": null, "previous": null},
            "results": results
        })
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        assert_eq!(node().base_url().as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn test_absolute_url() {
        let node = node();
        let url = node.absolute_url("users", RouteKind::List, HttpMethod::Get).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/");

        let post = node.absolute_url("users", RouteKind::Detail, HttpMethod::Post).unwrap();
        assert_eq!(post.as_str(), "https://api.example.com/v1/users/");
    }

    #[test]
    fn test_absolute_url_unknown_route() {
        let result = node().absolute_url("groups", RouteKind::List, HttpMethod::Get);
        assert!(matches!(
            result.unwrap_err(),
            ConsumerError::UnknownRoute { resource: "groups", kind: RouteKind::List, .. }
        ));
    }

    #[test]
    fn test_absolute_url_detail_needs_id() {
        let result = node().absolute_url("users", RouteKind::Detail, HttpMethod::Get);
        assert!(matches!(result.unwrap_err(), ConsumerError::InvalidRoute(_)));
    }

    #[test]
    fn test_absolute_detail_url() {
        let url = node().absolute_detail_url("users", HttpMethod::Get, "42").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/users/42/");

        let result = node().absolute_detail_url("users", HttpMethod::Get, "../admin");
        assert!(matches!(result.unwrap_err(), ConsumerError::InvalidInput(_)));
    }

    #[test]
    fn test_absolute_detail_url_stays_in_collection() {
        for id in ["..\\admin", "%2e%2e", "%2E%2E%2Fadmin", "a\\..\\..", "c:"] {
            let url = node().absolute_detail_url("users", HttpMethod::Get, id).unwrap();
            assert!(url.path().starts_with("/v1/users/"), "{id} resolved to {url}");
            assert_eq!(url.path_segments().map(Iterator::count), Some(4), "{id} resolved to {url}");
        }
    }

    #[test]
    fn test_parameters_from_filter_composition() {
        let filters = [Filter::new("name", Comparator::IContains, "blubb")];
        let parameters = node().parameters_from(10, 100, &filters);

        assert_eq!(parameters.len(), 3);
        assert_eq!(parameters["offset"], json!(10));
        assert_eq!(parameters["limit"], json!(100));
        assert_eq!(parameters["name__icontains"], json!("blubb"));
    }

    #[test]
    fn test_parameters_filter_overrides_page_key() {
        let filters = [Filter::raw("limit", 5u8)];
        let parameters = node().parameters_from(0, 100, &filters);
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters["limit"], json!(5));
    }

    #[test]
    fn test_default_limit_resolution() {
        let node = Node::builder("https://api.example.com/", NullTransport)
            .default_limit_for("users", 200)
            .build()
            .unwrap();
        assert_eq!(node.default_limit("users"), 200);
        assert_eq!(node.default_limit("groups"), DEFAULT_LIMIT);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = Node::builder("https://api.example.com/", NullTransport).default_limit(0).build();
        assert!(matches!(result.unwrap_err(), ConsumerError::ConfigError(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = Node::builder("not a url", NullTransport).build();
        assert!(matches!(result.unwrap_err(), ConsumerError::InvalidUrl(_)));

        let result = Node::builder("mailto:api@example.com", NullTransport).build();
        assert!(matches!(result.unwrap_err(), ConsumerError::InvalidUrl(_)));
    }

    #[test]
    fn test_extract_list_response() {
        let json = envelope(json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]));
        let (pagination, users) = node().extract_list_response::<User>(&json).unwrap();

        assert_eq!(pagination.limit, 100);
        assert_eq!(pagination.offset, 0);
        assert_eq!(pagination.total_count, 250);
        assert_eq!(users.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_extract_list_response_bad_element_fails_all() {
        let json = envelope(json!([{"id": 1, "name": "a"}, {"id": "two"}]));
        let err = node().extract_list_response::<User>(&json).unwrap_err();
        assert!(matches!(
            err,
            ConsumerError::Decode(DecodeError::ListElement { index: 1, resource: "users", .. })
        ));
    }

    #[test]
    fn test_extract_list_response_envelope_errors() {
        let node = node();

        let err = node.extract_list_response::<User>(&json!({"results": []})).unwrap_err();
        assert!(
            matches!(err, ConsumerError::Decode(DecodeError::MissingField(ref f)) if f == "meta")
        );

        let meta = json!({"limit": 1, "offset": 0, "total_count": 0});
        let err = node.extract_list_response::<User>(&json!({"meta": meta.clone()})).unwrap_err();
        assert!(
            matches!(err, ConsumerError::Decode(DecodeError::MissingField(ref f)) if f == "results")
        );

        let err = node
            .extract_list_response::<User>(&json!({"meta": meta, "results": {}}))
            .unwrap_err();
        assert!(matches!(err, ConsumerError::Decode(DecodeError::WrongType { .. })));

        let err = node.extract_list_response::<User>(&json!([])).unwrap_err();
        assert!(matches!(err, ConsumerError::Decode(DecodeError::WrongType { .. })));
    }

    #[test]
    fn test_extract_list_response_custom_keys() {
        let keys = PaginationKeys { total_count: "count".to_owned(), ..PaginationKeys::default() };
        let node = Node::builder("https://api.example.com/", NullTransport)
            .pagination_keys_for("users", keys)
            .build()
            .unwrap();

        let json = json!({"meta": {"limit": 10, "offset": 0, "count": 1}, "results": []});
        let (pagination, users) = node.extract_list_response::<User>(&json).unwrap();
        assert_eq!(pagination.total_count, 1);
        assert!(users.is_empty());
    }

    #[test]
    fn test_extract_single_object() {
        let user: User = node().extract_single_object(json!({"id": 7, "name": "g"})).unwrap();
        assert_eq!(user, User { id: 7, name: "g".to_owned() });

        let err = node().extract_single_object::<User>(json!({"id": 7})).unwrap_err();
        assert!(matches!(err, ConsumerError::Decode(DecodeError::Object { resource: "users", .. })));
    }

    #[test]
    fn test_from_config() {
        let config = NodeConfig::from_toml(
            r#"
            base_url = "https://api.example.com/v1/"
            default_limit = 300

            [[routes]]
            resource = "users"
            kind = "list"
            path = "users/"

            [resources.users]
            default_limit = 50
            default_filters = [{ key = "is_active", value = true }]
            "#,
        )
        .unwrap();

        let node = Node::from_config(&config, NullTransport).unwrap();
        assert_eq!(node.default_limit("users"), 50);
        assert_eq!(node.default_limit("groups"), 300);
        assert_eq!(node.default_filters("users").len(), 1);
        assert!(node.default_filters("groups").is_empty());
        assert_eq!(node.routes().len(), 1);
    }

    #[test]
    fn test_debug_redacts_headers() {
        let node = Node::builder("https://api.example.com/", NullTransport)
            .default_header("Authorization", "Token s3cr3t")
            .build()
            .unwrap();
        let debug_str = format!("{node:?}");
        assert!(debug_str.contains("Authorization"));
        assert!(!debug_str.contains("s3cr3t"));
    }
}
