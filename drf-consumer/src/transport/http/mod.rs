//! HTTP transport implementation.
//!
//! This module provides HTTP/1.1 and HTTP/2 transport using reqwest.

use std::{sync::LazyLock, time::Duration};

use reqwest::{
    Client, Method,
    multipart::{Form, Part},
};
use serde_json::Value;
use tracing::{debug, instrument};

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{ConsumerError, Result},
    node::HttpMethod,
    payload::{ContentType, MultipartValue},
    transport::{RequestBody, RequestConfiguration, Transport},
};

/// Default HTTP client with connection pooling enabled.
///
/// Using a singleton avoids recreating the client per transport instance,
/// preserving connection pooling benefits across all default transports.
static DEFAULT_HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(100)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(HttpConfig::default_user_agent())
        .build()
        .unwrap_or_default()
});

/// Validates header name and value for CRLF injection prevention.
fn validate_header(name: &str, value: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ConsumerError::TransportError("Invalid header name: empty".to_owned()));
    }
    if name.contains('\r') || name.contains('\n') || name.contains('\0') {
        return Err(ConsumerError::TransportError(
            "Invalid header name: control characters not allowed".to_owned(),
        ));
    }
    if value.contains('\r') || value.contains('\n') || value.contains('\0') {
        return Err(ConsumerError::TransportError(
            "Invalid header value: control characters not allowed".to_owned(),
        ));
    }
    Ok(())
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn multipart_form(parts: Vec<(String, MultipartValue)>) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in parts {
        let mut part = Part::bytes(value.bytes).mime_str(value.content_type.as_str())?;
        if value.content_type != ContentType::ApplicationJson {
            part = part.file_name(name.clone());
        }
        form = form.part(name, part);
    }
    Ok(form)
}

/// Decodes a response body. An empty body decodes to [`Value::Null`].
fn decode_body(bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
        .map_err(|e| ConsumerError::InvalidResponse(format!("body is not JSON: {e}")))
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Supports automatic connection pooling, keep-alive, and HTTP/2 multiplexing.
///
/// # Examples
///
/// ```rust,no_run
/// use drf_consumer::{
///     node::HttpMethod,
///     transport::{HttpTransport, RequestConfiguration, Transport},
/// };
///
/// # async fn example() -> drf_consumer::error::Result<()> {
/// let transport = HttpTransport::new()?;
///
/// let url = url::Url::parse("https://api.example.com/v1/users/42/").unwrap();
/// let cfg = RequestConfiguration::new(url, HttpMethod::Get);
///
/// let user = transport.fire_json_request(cfg).await?;
/// println!("{user}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
}

impl HttpTransport {
    /// Creates a new HTTP transport with default settings.
    ///
    /// Uses a shared singleton client for connection pooling efficiency.
    ///
    /// Default configuration:
    /// - Pool max idle per host: 100
    /// - Timeout: 30 seconds
    /// - Connect timeout: 10 seconds
    /// - HTTP version: Auto (prefer HTTP/2)
    ///
    /// # Errors
    ///
    /// This method is infallible but returns `Result` for API consistency.
    ///
    /// # Examples
    ///
    /// ```
    /// use drf_consumer::transport::HttpTransport;
    ///
    /// let transport = HttpTransport::new().unwrap();
    /// ```
    pub fn new() -> Result<Self> {
        Ok(Self { client: DEFAULT_HTTP_CLIENT.clone(), http_version: HttpVersion::Auto })
    }

    /// Creates HTTP transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is out of bounds or the HTTP client
    /// cannot be built.
    ///
    /// # Examples
    ///
    /// ```
    /// use drf_consumer::transport::{HttpConfig, HttpTransport, HttpVersion};
    ///
    /// let config = HttpConfig { http_version: HttpVersion::Http1, ..HttpConfig::default() };
    ///
    /// let transport = HttpTransport::with_config(&config).unwrap();
    /// ```
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str());

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build()?;

        Ok(Self { client, http_version: config.http_version })
    }

    /// Wraps an existing reqwest client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client, http_version: HttpVersion::Auto }
    }

    #[instrument(
        skip(self, cfg),
        fields(method = %cfg.method, url = %cfg.url, encoding = ?cfg.encoding)
    )]
    async fn execute_request(&self, cfg: RequestConfiguration) -> Result<Value> {
        for (name, value) in &cfg.headers {
            validate_header(name, value)?;
        }

        let mut request = self.client.request(reqwest_method(cfg.method), cfg.url.clone());

        let query = cfg.query_pairs();
        if !query.is_empty() {
            request = request.query(&query);
        }

        for (name, value) in &cfg.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        request = match cfg.body()? {
            RequestBody::Empty => request,
            RequestBody::Json(body) => request.json(&body),
            RequestBody::Multipart(parts) => request.multipart(multipart_form(parts)?),
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        if !cfg.accepts(status) {
            return Err(ConsumerError::Status {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        debug!(status, len = bytes.len(), "response received");
        decode_body(&bytes)
    }
}

impl Transport for HttpTransport {
    async fn fire_json_request(&self, cfg: RequestConfiguration) -> Result<Value> {
        self.execute_request(cfg).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;

    #[test]
    fn test_http_transport_new() {
        let transport = HttpTransport::new();
        assert!(transport.is_ok());
    }

    #[test]
    fn test_http_transport_protocol_name() {
        let config_http1 = HttpConfig { http_version: HttpVersion::Http1, ..Default::default() };
        let transport_http1 = HttpTransport::with_config(&config_http1).unwrap();
        assert_eq!(transport_http1.protocol_name(), "http/1.1");

        let config_http2 = HttpConfig { http_version: HttpVersion::Http2, ..Default::default() };
        let transport_http2 = HttpTransport::with_config(&config_http2).unwrap();
        assert_eq!(transport_http2.protocol_name(), "http/2");

        let transport_auto = HttpTransport::new().unwrap();
        assert_eq!(transport_auto.protocol_name(), "http");
    }

    #[test]
    fn test_http_transport_rejects_invalid_config() {
        let config = HttpConfig { timeout_secs: 0, ..Default::default() };
        let result = HttpTransport::with_config(&config);
        assert!(matches!(result.unwrap_err(), ConsumerError::ConfigError(_)));
    }

    #[test]
    fn test_http_transport_with_client() {
        let transport = HttpTransport::with_client(Client::new());
        assert_eq!(transport.protocol_name(), "http");
    }

    #[tokio::test]
    async fn test_http_transport_rejects_crlf_header() {
        let transport = HttpTransport::new().unwrap();
        let cfg = RequestConfiguration::new(
            Url::parse("https://api.example.com/users/").unwrap(),
            HttpMethod::Get,
        )
        .with_header("X-Evil\r\n", "value");

        let result = transport.fire_json_request(cfg).await;
        assert!(matches!(result.unwrap_err(), ConsumerError::TransportError(_)));
    }

    #[test]
    fn test_reqwest_method_mapping() {
        assert_eq!(reqwest_method(HttpMethod::Get), Method::GET);
        assert_eq!(reqwest_method(HttpMethod::Post), Method::POST);
        assert_eq!(reqwest_method(HttpMethod::Put), Method::PUT);
        assert_eq!(reqwest_method(HttpMethod::Patch), Method::PATCH);
        assert_eq!(reqwest_method(HttpMethod::Delete), Method::DELETE);
    }

    #[test]
    fn test_decode_body_empty_is_null() {
        assert_eq!(decode_body(b"").unwrap(), Value::Null);
        assert_eq!(decode_body(b"  \n").unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_body_json() {
        assert_eq!(decode_body(br#"{"id": 1}"#).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_decode_body_invalid() {
        let result = decode_body(b"<html>oops</html>");
        assert!(matches!(result.unwrap_err(), ConsumerError::InvalidResponse(_)));
    }

    #[test]
    fn test_multipart_form_builds() {
        let parts = vec![
            ("data".to_owned(), MultipartValue::new(b"{}".to_vec(), ContentType::ApplicationJson)),
            ("photo".to_owned(), MultipartValue::new(vec![1, 2, 3], ContentType::ImagePng)),
        ];
        assert!(multipart_form(parts).is_ok());
    }

    #[test]
    fn test_validate_header_valid() {
        assert!(validate_header("Content-Type", "application/json").is_ok());
        assert!(validate_header("Authorization", "Token abc").is_ok());
    }

    #[test]
    fn test_validate_header_crlf_injection_blocked() {
        let result = validate_header("X-Evil\r\n", "value");
        assert!(matches!(result.unwrap_err(), ConsumerError::TransportError(_)));

        assert!(validate_header("X-Custom", "value\r\nEvil-Header: injected").is_err());
        assert!(validate_header("X-Evil\0", "value").is_err());
        assert!(validate_header("X-Custom", "value\0evil").is_err());
        assert!(validate_header("", "value").is_err());
    }

    #[test]
    fn test_http_transport_debug_format() {
        let transport = HttpTransport::new().unwrap();
        let debug_str = format!("{transport:?}");
        assert!(debug_str.contains("HttpTransport"));
    }
}
