//! Error types for drf-consumer.
//!
//! All errors implement [`std::error::Error`] via [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Transport Errors** ([`ConsumerError::HttpError`], [`ConsumerError::Status`],
//!   [`ConsumerError::TransportError`]): the request never produced a usable JSON body
//! - **Decode Errors** ([`ConsumerError::Decode`], [`ConsumerError::InvalidResponse`]):
//!   the backend answered, but the body violated the envelope or object contract
//! - **Setup Errors** ([`ConsumerError::UnknownRoute`], [`ConsumerError::InvalidRoute`],
//!   [`ConsumerError::InvalidUrl`], [`ConsumerError::ConfigError`]): the node or a route is
//!   misconfigured
//!
//! # Examples
//!
//! ```
//! use drf_consumer::error::{ConsumerError, DecodeError, Result};
//!
//! fn require_limit(meta: &serde_json::Value) -> Result<u64> {
//!     meta.get("limit")
//!         .and_then(serde_json::Value::as_u64)
//!         .ok_or_else(|| DecodeError::MissingField("meta.limit".to_owned()).into())
//! }
//!
//! let err = require_limit(&serde_json::json!({})).unwrap_err();
//! assert!(matches!(err, ConsumerError::Decode(DecodeError::MissingField(_))));
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::node::{HttpMethod, RouteKind};

/// Result type alias for drf-consumer operations.
pub type Result<T> = std::result::Result<T, ConsumerError>;

/// Errors that can occur while building, sending, or decoding a request.
///
/// Failures are delivered unchanged to every registered client of the failing
/// capability, so descriptors carry them behind an [`Arc`] and the error itself
/// is [`Clone`].
///
/// # Error Recovery
///
/// - **Transient errors** ([`HttpError`](Self::HttpError)): the core never retries; retry at
///   the call site if appropriate
/// - **Backend errors** ([`Status`](Self::Status)): inspect the body the backend returned
/// - **Decode errors** ([`Decode`](Self::Decode)): the backend broke the envelope contract;
///   this is not retryable
/// - **Setup errors**: fix the node configuration or route registry
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Clone, Error)]
pub enum ConsumerError {
    /// HTTP request failed before a response was received.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS and TLS failures.
    #[error("HTTP request failed: {0}")]
    HttpError(#[source] Arc<reqwest::Error>),

    /// Backend answered with a non-success status code.
    #[error("backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded as UTF-8.
        body: String,
    },

    /// Backend answered with a body that is not JSON.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// A required envelope or object field was missing or mistyped.
    #[error("failed to decode response: {0}")]
    Decode(#[from] DecodeError),

    /// No route is registered for the resource, kind, and method.
    #[error("no {kind} route with method {method} registered for '{resource}'")]
    UnknownRoute {
        /// Resource name the lookup was made for.
        resource: &'static str,
        /// Requested route kind.
        kind: RouteKind,
        /// Requested HTTP method.
        method: HttpMethod,
    },

    /// A route's relative URL is not acceptable.
    #[error("invalid route: {0}")]
    InvalidRoute(String),

    /// A URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Node configuration is invalid.
    #[error("invalid node configuration: {0}")]
    ConfigError(String),

    /// Request could not be handed to the transport.
    ///
    /// Raised for header injection attempts and unsupported request shapes.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Caller supplied an unusable value, such as a resource id containing `/`.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Outgoing payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    SerializationError(String),

    /// Request was cancelled through its handle before it completed.
    #[error("request was cancelled")]
    Cancelled,

    /// Spawned request task panicked, for example inside an observer callback.
    ///
    /// Observers may or may not have been notified.
    #[error("request task panicked: {0}")]
    TaskPanicked(String),
}

impl From<reqwest::Error> for ConsumerError {
    fn from(error: reqwest::Error) -> Self {
        Self::HttpError(Arc::new(error))
    }
}

/// Typed decode failures.
///
/// Every site that reads a required field from a backend response reports one
/// of these instead of aborting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A required field is absent.
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// A field is present but has the wrong JSON type.
    #[error("field '{field}' has the wrong type, expected {expected}")]
    WrongType {
        /// Dotted path of the field.
        field: String,
        /// Expected JSON type.
        expected: &'static str,
    },

    /// A URL field could not be parsed.
    #[error("field '{field}' is not a valid URL: {reason}")]
    InvalidUrl {
        /// Dotted path of the field.
        field: String,
        /// Parser message.
        reason: String,
    },

    /// A single object could not be decoded into the resource type.
    #[error("could not decode {resource}: {reason}")]
    Object {
        /// Resource name.
        resource: &'static str,
        /// Deserializer message.
        reason: String,
    },

    /// One element of a `results` array could not be decoded.
    #[error("result {index} could not be decoded as {resource}: {reason}")]
    ListElement {
        /// Position inside `results`.
        index: usize,
        /// Resource name.
        resource: &'static str,
        /// Deserializer message.
        reason: String,
    },
}
