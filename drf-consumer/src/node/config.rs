//! Node configuration types.
//!
//! This module defines the TOML-deserializable configuration a [`Node`](super::Node)
//! can be built from.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use url::Url;

use crate::{
    error::{ConsumerError, Result},
    node::{
        Comparator, DEFAULT_LIMIT, Filter, HttpMethod, PaginationKeys, Route, RouteKind,
        RouteRegistry,
    },
    transport::HttpConfig,
};

/// Root node configuration.
///
/// # Examples
///
/// ```
/// use drf_consumer::node::NodeConfig;
///
/// let config = NodeConfig::from_toml(
///     r#"
///     base_url = "https://api.example.com/v1/"
///     default_limit = 500
///
///     [[routes]]
///     resource = "users"
///     kind = "list"
///     path = "users/"
///
///     [[routes]]
///     resource = "users"
///     kind = "detail"
///     path = "users/{id}/"
///
///     [resources.users]
///     default_limit = 200
///     default_filters = [{ key = "is_active", value = true }]
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.default_limit, 500);
/// assert_eq!(config.route_registry().unwrap().len(), 2);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Base URL all routes are resolved against.
    pub base_url: String,

    /// Page size for list GETs without an explicit limit.
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Authentication header sent with every request.
    #[serde(default)]
    pub auth: Option<AuthConfig>,

    /// Route table.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Per-resource settings, keyed by resource name.
    #[serde(default)]
    pub resources: HashMap<String, ResourceConfig>,
}

const fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl NodeConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::ConfigError`] if the TOML is malformed or
    /// validation fails, [`ConsumerError::InvalidRoute`] for a bad route path.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ConsumerError::ConfigError(format!("invalid TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::ConfigError`] if the file cannot be read, plus
    /// everything [`from_toml`](Self::from_toml) returns.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConsumerError::ConfigError(format!("cannot read config file: {e}")))?;
        Self::from_toml(&content)
    }

    /// Validates the configuration.
    ///
    /// This method checks for:
    /// - Base URL must parse and use `http` or `https`
    /// - Default limits must be positive
    /// - Route paths must be relative and free of `..` and `//`
    /// - No two routes may share resource, kind, and method
    /// - Environment variable and header names in the auth config must be well-formed
    /// - Filter keys must be non-empty and free of query delimiters
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::ConfigError`] or [`ConsumerError::InvalidRoute`]
    /// if any validation fails.
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;

        if self.default_limit == 0 {
            return Err(ConsumerError::ConfigError("default_limit must be positive".to_owned()));
        }

        self.http.validate()?;

        if let Some(ref auth) = self.auth {
            auth.validate()?;
        }

        self.route_registry()?;

        for (name, resource) in &self.resources {
            resource.validate(name)?;
        }

        Ok(())
    }

    /// Base URL, parsed.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::ConfigError`] if the URL does not parse or is
    /// not `http` or `https`.
    pub fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            ConsumerError::ConfigError(format!("invalid base_url '{}': {e}", self.base_url))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConsumerError::ConfigError(format!(
                "base_url must use http or https, got: {}",
                url.scheme()
            )));
        }

        Ok(url)
    }

    /// Builds the route table.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::InvalidRoute`] for a bad path and
    /// [`ConsumerError::ConfigError`] for a duplicate route.
    pub fn route_registry(&self) -> Result<RouteRegistry> {
        let mut registry = RouteRegistry::new();
        for entry in &self.routes {
            let route = entry.to_route()?;
            if registry.insert(route).is_some() {
                return Err(ConsumerError::ConfigError(format!(
                    "duplicate {} route with method {} for '{}'",
                    entry.kind, entry.method, entry.resource
                )));
            }
        }
        Ok(registry)
    }
}

/// One route table entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Resource name.
    pub resource: String,

    /// Route kind.
    pub kind: RouteKind,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: HttpMethod,

    /// Path relative to the base URL, e.g. `"users/{id}/"`.
    pub path: String,
}

const fn default_method() -> HttpMethod {
    HttpMethod::Get
}

impl RouteConfig {
    /// Converts the entry into a validated [`Route`].
    ///
    /// # Errors
    ///
    /// See [`Route::new`].
    pub fn to_route(&self) -> Result<Route> {
        Route::new(self.resource.clone(), self.kind, self.method, self.path.clone())
    }
}

/// Settings for one resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceConfig {
    /// Page size overriding the node default.
    #[serde(default)]
    pub default_limit: Option<u64>,

    /// Filters added to list GETs issued through `Node::get_filtered_list`.
    #[serde(default)]
    pub default_filters: Vec<FilterConfig>,

    /// Names of the pagination members in list responses.
    #[serde(default)]
    pub pagination: PaginationKeys,
}

impl ResourceConfig {
    fn validate(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ConsumerError::ConfigError("resource name cannot be empty".to_owned()));
        }

        if self.default_limit == Some(0) {
            return Err(ConsumerError::ConfigError(format!(
                "resources.{name}.default_limit must be positive"
            )));
        }

        for filter in &self.default_filters {
            validate_filter_key(name, &filter.key)?;
        }

        Ok(())
    }

    /// Default filters as [`Filter`]s.
    #[must_use]
    pub fn filters(&self) -> Vec<Filter> {
        self.default_filters.iter().map(FilterConfig::to_filter).collect()
    }
}

/// A configured filter.
///
/// With a `lookup`, `key` is the field name and the lookup suffix is
/// appended; without one, `key` is used verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Field name or full query key.
    pub key: String,

    /// Optional lookup, e.g. `"icontains"`.
    #[serde(default)]
    pub lookup: Option<Comparator>,

    /// Filter value.
    pub value: serde_json::Value,
}

impl FilterConfig {
    /// Converts the entry into a [`Filter`].
    #[must_use]
    pub fn to_filter(&self) -> Filter {
        match self.lookup {
            Some(comparator) => Filter::new(&self.key, comparator, &self.value),
            None => Filter::raw(self.key.clone(), &self.value),
        }
    }
}

/// Validates a filter key for use as a query parameter name.
fn validate_filter_key(resource: &str, key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(ConsumerError::ConfigError(format!(
            "resources.{resource}: filter key cannot be empty"
        )));
    }

    if let Some(ch) = key.chars().find(|c| "&=#?".contains(*c) || c.is_control()) {
        return Err(ConsumerError::ConfigError(format!(
            "resources.{resource}: filter key contains invalid character {ch:?}: {key}"
        )));
    }

    Ok(())
}

/// Authentication configuration.
///
/// Secrets are never stored in the file; each variant names the environment
/// variable holding them.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// API key sent in a custom header.
    ApiKey {
        /// Header name for the API key.
        header: String,
        /// Environment variable containing the key.
        env_var: String,
    },
    /// `Authorization: Bearer <token>`.
    Bearer {
        /// Environment variable containing the token.
        env_var: String,
    },
    /// `Authorization: Token <key>`, as used by Django REST framework's
    /// token authentication.
    Token {
        /// Environment variable containing the key.
        env_var: String,
    },
}

impl AuthConfig {
    /// Validates authentication configuration.
    ///
    /// Checks that:
    /// - Environment variable names are alphanumeric with underscores only
    /// - Header names do not contain injection characters
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::ConfigError`] if any value is invalid.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::ApiKey { header, env_var } => {
                validate_env_var_name(env_var)?;
                validate_header_name(header)?;
            }
            Self::Bearer { env_var } | Self::Token { env_var } => {
                validate_env_var_name(env_var)?;
            }
        }
        Ok(())
    }

    /// Resolves the header from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::ConfigError`] if the variable is unset or empty.
    pub fn resolve(&self) -> Result<(String, String)> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    pub(crate) fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(String, String)> {
        let env_var = match self {
            Self::ApiKey { env_var, .. } | Self::Bearer { env_var } | Self::Token { env_var } => {
                env_var
            }
        };

        let secret = lookup(env_var).filter(|s| !s.is_empty()).ok_or_else(|| {
            ConsumerError::ConfigError(format!("environment variable '{env_var}' is not set"))
        })?;

        Ok(match self {
            Self::ApiKey { header, .. } => (header.clone(), secret),
            Self::Bearer { .. } => ("Authorization".to_owned(), format!("Bearer {secret}")),
            Self::Token { .. } => ("Authorization".to_owned(), format!("Token {secret}")),
        })
    }
}

/// Validates an environment variable name.
fn validate_env_var_name(name: &str) -> Result<()> {
    let Some(first_char) = name.chars().next() else {
        return Err(ConsumerError::ConfigError(
            "environment variable name cannot be empty".to_owned(),
        ));
    };

    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(ConsumerError::ConfigError(format!(
            "environment variable name must start with letter or underscore: {name}"
        )));
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(ConsumerError::ConfigError(format!(
                "environment variable name contains invalid character '{ch}': {name}"
            )));
        }
    }

    Ok(())
}

/// Validates an HTTP header name.
fn validate_header_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ConsumerError::ConfigError("header name cannot be empty".to_owned()));
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && !"-_".contains(ch) {
            return Err(ConsumerError::ConfigError(format!(
                "header name contains invalid character '{ch}': {name}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unreachable,
    reason = "test code uses unreachable for expected-path assertions"
)]
mod tests {
    use super::*;
    use crate::payload::JsonValue;

    const MINIMAL: &str = r#"base_url = "https://api.example.com/""#;

    #[test]
    fn test_minimal_config_defaults() {
        let config = NodeConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.default_limit, 1000);
        assert!(config.auth.is_none());
        assert!(config.routes.is_empty());
        assert!(config.resources.is_empty());
        assert_eq!(config.http.timeout_secs, HttpConfig::default().timeout_secs);
    }

    #[test]
    fn test_routes_from_toml() {
        let toml = r#"
            base_url = "https://api.example.com/v1/"

            [[routes]]
            resource = "users"
            kind = "list"
            path = "users/"

            [[routes]]
            resource = "users"
            kind = "detail"
            method = "POST"
            path = "users/"
        "#;

        let config = NodeConfig::from_toml(toml).unwrap();
        let registry = config.route_registry().unwrap();
        assert!(registry.find("users", RouteKind::List, HttpMethod::Get).is_some());
        let post = registry.find("users", RouteKind::Detail, HttpMethod::Post).unwrap();
        assert_eq!(post.relative_url(), "users/");
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let toml = r#"
            base_url = "https://api.example.com/"

            [[routes]]
            resource = "users"
            kind = "list"
            path = "users/"

            [[routes]]
            resource = "users"
            kind = "list"
            path = "people/"
        "#;

        let result = NodeConfig::from_toml(toml);
        assert!(matches!(result.unwrap_err(), ConsumerError::ConfigError(_)));
    }

    #[test]
    fn test_route_traversal_rejected() {
        let toml = r#"
            base_url = "https://api.example.com/"

            [[routes]]
            resource = "users"
            kind = "list"
            path = "../admin/"
        "#;

        let result = NodeConfig::from_toml(toml);
        assert!(matches!(result.unwrap_err(), ConsumerError::InvalidRoute(_)));
    }

    #[test]
    fn test_resource_settings() {
        let toml = r#"
            base_url = "https://api.example.com/"

            [resources.users]
            default_limit = 200
            default_filters = [
                { key = "is_active", value = true },
                { key = "name", lookup = "icontains", value = "ann" },
            ]

            [resources.users.pagination]
            total_count = "count"
        "#;

        let config = NodeConfig::from_toml(toml).unwrap();
        let users = &config.resources["users"];
        assert_eq!(users.default_limit, Some(200));
        assert_eq!(users.pagination.total_count, "count");
        assert_eq!(users.pagination.limit, "limit");

        let filters = users.filters();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].string_key(), "is_active");
        assert_eq!(filters[0].value(), &JsonValue::Bool(true));
        assert_eq!(filters[1].string_key(), "name__icontains");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            r#"base_url = "not a url""#,
            r#"base_url = "ftp://files.example.com/""#,
            "base_url = \"https://api.example.com/\"\ndefault_limit = 0",
            "base_url = \"https://api.example.com/\"\n[resources.users]\ndefault_limit = 0",
            "base_url = \"https://api.example.com/\"\n[resources.users]\ndefault_filters = [{ key = \"a&b\", value = 1 }]",
            "base_url = \"https://api.example.com/\"\n[http]\ntimeout_secs = 0",
        ];

        for toml in cases {
            let result = NodeConfig::from_toml(toml);
            assert!(
                matches!(result, Err(ConsumerError::ConfigError(_))),
                "expected config error for {toml:?}"
            );
        }
    }

    #[test]
    fn test_malformed_toml() {
        let result = NodeConfig::from_toml("base_url = ");
        assert!(matches!(result.unwrap_err(), ConsumerError::ConfigError(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let result = NodeConfig::from_file("/nonexistent/drf-consumer.toml");
        assert!(matches!(result.unwrap_err(), ConsumerError::ConfigError(_)));
    }

    #[test]
    fn test_auth_config_api_key() {
        let toml = r#"
            base_url = "https://api.example.com/"

            [auth]
            type = "api_key"
            header = "X-API-Key"
            env_var = "BACKEND_API_KEY"
        "#;

        let config = NodeConfig::from_toml(toml).unwrap();
        let Some(auth @ AuthConfig::ApiKey { .. }) = config.auth else {
            unreachable!("expected ApiKey auth config")
        };
        let header = auth.resolve_with(|_| Some("k3y".to_owned())).unwrap();
        assert_eq!(header, ("X-API-Key".to_owned(), "k3y".to_owned()));
    }

    #[test]
    fn test_auth_config_token_and_bearer() {
        let token = AuthConfig::Token { env_var: "DRF_TOKEN".to_owned() };
        assert_eq!(
            token.resolve_with(|_| Some("abc".to_owned())).unwrap(),
            ("Authorization".to_owned(), "Token abc".to_owned())
        );

        let bearer = AuthConfig::Bearer { env_var: "JWT".to_owned() };
        assert_eq!(
            bearer.resolve_with(|_| Some("abc".to_owned())).unwrap(),
            ("Authorization".to_owned(), "Bearer abc".to_owned())
        );
    }

    #[test]
    fn test_auth_unset_variable() {
        let auth = AuthConfig::Token { env_var: "DRF_CONSUMER_TEST_UNSET_VARIABLE".to_owned() };
        assert!(matches!(auth.resolve().unwrap_err(), ConsumerError::ConfigError(_)));
        assert!(auth.resolve_with(|_| Some(String::new())).is_err());
    }

    #[test]
    fn test_env_var_name_validation() {
        assert!(validate_env_var_name("API_KEY").is_ok());
        assert!(validate_env_var_name("_PRIVATE").is_ok());
        assert!(validate_env_var_name("").is_err());
        assert!(validate_env_var_name("1KEY").is_err());
        assert!(validate_env_var_name("KEY-NAME").is_err());
        assert!(validate_env_var_name("KEY;rm").is_err());
    }

    #[test]
    fn test_header_name_validation() {
        assert!(validate_header_name("X-API-Key").is_ok());
        assert!(validate_header_name("").is_err());
        assert!(validate_header_name("X-Key\r\n").is_err());
        assert!(validate_header_name("X Key").is_err());
    }
}
