//! Transport abstraction layer.
//!
//! The node never touches sockets, status codes, or raw bytes. It hands a
//! [`RequestConfiguration`] to a [`Transport`] and gets back either the decoded
//! JSON value of the response or an error.
//!
//! # Architecture
//!
//! - **Transport**: protocol communication ([`HttpTransport`] over reqwest)
//! - **Node**: URL resolution, parameter building, and response decoding
//!
//! # Examples
//!
//! ```rust,no_run
//! use drf_consumer::{
//!     node::HttpMethod,
//!     transport::{HttpTransport, RequestConfiguration, Transport},
//! };
//!
//! # async fn example() -> drf_consumer::error::Result<()> {
//! let transport = HttpTransport::new()?;
//!
//! let url = url::Url::parse("https://api.example.com/v1/users/").unwrap();
//! let mut parameters = serde_json::Map::new();
//! parameters.insert("limit".to_owned(), serde_json::json!(50));
//!
//! let cfg = RequestConfiguration::new(url, HttpMethod::Get).with_parameters(parameters);
//! let json = transport.fire_json_request(cfg).await?;
//! println!("{json}");
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::ops::Range;

use serde_json::Value;
use url::Url;

use crate::{
    error::Result,
    node::HttpMethod,
    payload::{self, JsonValue, MultipartValue, Payload, UnwrappedJson},
};

pub mod config;
pub mod http;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// Status codes a response may carry and still be decoded.
pub const ACCEPTABLE_STATUS_CODES: Range<u16> = 200..300;

/// How [`RequestConfiguration::parameters`] travel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParameterEncoding {
    /// Query string. Arrays are joined with `,`.
    #[default]
    Url,
    /// JSON object body.
    Json,
    /// Multipart body: the parameters as one JSON part, then the binary parts.
    Multipart,
}

/// Materialized body of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON body.
    Json(Value),
    /// Named multipart parts in send order.
    Multipart(Vec<(String, MultipartValue)>),
}

/// Everything a transport needs to send one request.
#[derive(Debug, Clone)]
pub struct RequestConfiguration {
    /// Absolute request URL.
    pub url: Url,
    /// HTTP method.
    pub method: HttpMethod,
    /// Query or body parameters, depending on `encoding`.
    pub parameters: UnwrappedJson,
    /// Parameter encoding.
    pub encoding: ParameterEncoding,
    /// Extra request headers.
    pub headers: Vec<(String, String)>,
    /// Binary parts sent when `encoding` is [`ParameterEncoding::Multipart`].
    pub parts: Vec<(String, MultipartValue)>,
    /// Status codes treated as success.
    pub acceptable_status_codes: Range<u16>,
}

impl RequestConfiguration {
    /// Creates a configuration with no parameters, URL encoding, and no headers.
    #[must_use]
    pub fn new(url: Url, method: HttpMethod) -> Self {
        Self {
            url,
            method,
            parameters: UnwrappedJson::new(),
            encoding: ParameterEncoding::Url,
            headers: Vec::new(),
            parts: Vec::new(),
            acceptable_status_codes: ACCEPTABLE_STATUS_CODES,
        }
    }

    /// Configuration carrying `payload` as its body.
    ///
    /// The payload's JSON fields become the parameters, with
    /// `additional_parameters` written over them. The encoding is JSON unless
    /// the payload holds binary parts.
    #[must_use]
    pub fn for_payload(url: Url, payload: &Payload, additional_parameters: UnwrappedJson) -> Self {
        let mut parameters = payload.json().clone();
        parameters.extend(additional_parameters);

        let (encoding, parts) = if payload.is_multipart() {
            let parts = payload
                .multipart()
                .iter()
                .map(|(path, value)| (path.to_string(), value.clone()))
                .collect();
            (ParameterEncoding::Multipart, parts)
        } else {
            (ParameterEncoding::Json, Vec::new())
        };

        Self { parameters, encoding, parts, ..Self::new(url, payload.method()) }
    }

    /// Replaces the parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: UnwrappedJson) -> Self {
        self.parameters = parameters;
        self
    }

    /// Replaces the encoding.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: ParameterEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Appends headers.
    #[must_use]
    pub fn with_headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Appends one header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Query pairs, non-empty only for [`ParameterEncoding::Url`].
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        if self.encoding != ParameterEncoding::Url {
            return Vec::new();
        }
        self.parameters
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::from_wire(v.clone()).to_query_value()))
            .collect()
    }

    /// Body implied by the encoding.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::SerializationError`](crate::error::ConsumerError::SerializationError)
    /// if the multipart envelope cannot be laid out.
    pub fn body(&self) -> Result<RequestBody> {
        match self.encoding {
            ParameterEncoding::Url => Ok(RequestBody::Empty),
            ParameterEncoding::Json => Ok(RequestBody::Json(Value::Object(self.parameters.clone()))),
            ParameterEncoding::Multipart => {
                Ok(RequestBody::Multipart(payload::envelope(&self.parameters, self.parts.clone())?))
            }
        }
    }

    /// Returns true if `status` counts as success.
    #[must_use]
    pub fn accepts(&self, status: u16) -> bool {
        self.acceptable_status_codes.contains(&status)
    }
}

/// Sends requests and decodes their responses as JSON.
///
/// Implementations must:
/// - resolve with the decoded JSON body on an acceptable status
/// - resolve with [`Value::Null`] for an empty body
/// - never retry on their own
///
/// # Examples
///
/// A canned transport for tests:
///
/// ```
/// use drf_consumer::{
///     error::Result,
///     transport::{RequestConfiguration, Transport},
/// };
///
/// struct Canned(serde_json::Value);
///
/// impl Transport for Canned {
///     async fn fire_json_request(&self, _cfg: RequestConfiguration) -> Result<serde_json::Value> {
///         Ok(self.0.clone())
///     }
///
///     fn protocol_name(&self) -> &'static str {
///         "canned"
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Executes `cfg` and returns the decoded JSON response.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the status is not acceptable, or the
    /// body is not JSON.
    fn fire_json_request(
        &self,
        cfg: RequestConfiguration,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// Returns the protocol name for logging.
    ///
    /// Examples: "http/1.1", "http/2"
    fn protocol_name(&self) -> &'static str;
}
