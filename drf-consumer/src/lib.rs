//! drf-consumer: Typed Client for Django REST Framework Style Backends
//!
//! A Rust library for talking to REST backends that follow the Django REST
//! framework conventions: list and detail endpoints, limit/offset pagination
//! envelopes, lookup-style filters, and JSON or multipart request bodies.
//!
//! # What is drf-consumer?
//!
//! Domain types opt into capabilities, and a shared [`Node`](node::Node) drives
//! the requests behind them:
//!
//! - **Capabilities**: list GET, detail GET, and single POST, each a separate trait
//! - **Payload Engine**: one recursive pass renders a domain object into a JSON
//!   map and a set of multipart parts, with a pluggable conversion per key path
//! - **Observer Fan-out**: every completed request notifies the observers attached
//!   for its capability and type, exactly once, on success or failure
//! - **Typed Decoding**: a broken envelope or object is a [`DecodeError`], never a panic
//! - **Cancellation**: spawned requests return a [`RequestHandle`](resource::RequestHandle)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   Domain types   │  ListGettable / DetailGettable / SinglePostable
//! └────────┬─────────┘
//!          │ get_list / get_detail / post
//! ┌────────▼──────────────────────────────────────────┐
//! │                      Node                         │
//! │  ┌─────────────┐  ┌────────────┐  ┌────────────┐  │
//! │  │   Routes    │  │  Payload   │  │  Clients   │  │
//! │  │  (URL +     │  │  (JSON +   │  │  (observer │  │
//! │  │   filters)  │  │  multipart)│  │   fan-out) │  │
//! │  └─────────────┘  └────────────┘  └────────────┘  │
//! └────────┬──────────────────────────────────────────┘
//!          │ RequestConfiguration
//! ┌────────▼─────────┐
//! │    Transport     │  reqwest (HTTP/1.1, HTTP/2) or a test double
//! └──────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## 1. Fetch a Page
//!
//! ```rust,no_run
//! use drf_consumer::{
//!     node::{Comparator, Filter, Node, Route},
//!     resource::{ListGettable, ListRequest, Resource},
//!     transport::HttpTransport,
//! };
//!
//! #[derive(Debug, serde::Deserialize)]
//! struct User {
//!     id: u64,
//!     username: String,
//! }
//!
//! impl Resource for User {
//!     const RESOURCE_NAME: &'static str = "users";
//! }
//!
//! impl ListGettable for User {}
//!
//! # async fn example() -> drf_consumer::Result<()> {
//! let node = Node::builder("https://api.example.com/v1/", HttpTransport::new()?)
//!     .route(Route::list_get::<User>("users/")?)
//!     .build()?;
//!
//! let page = node
//!     .get_list::<User>(
//!         ListRequest::new().limit(50).filter(Filter::new("username", Comparator::IStartsWith, "a")),
//!     )
//!     .await?;
//!
//! println!("{} of {}", page.objects.len(), page.success.response_pagination.total_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## 2. Post with a File
//!
//! ```rust,no_run
//! use drf_consumer::{
//!     node::{HttpMethod, Node, Route},
//!     payload::{ContentType, MultipartValue, PayloadConvertible, PayloadDict, UnwrappedJson},
//!     resource::{Resource, SinglePostable},
//!     transport::HttpTransport,
//! };
//!
//! #[derive(Debug, Clone, serde::Deserialize)]
//! struct Avatar {
//!     id: Option<u64>,
//!     #[serde(skip)]
//!     image: Vec<u8>,
//! }
//!
//! impl Resource for Avatar {
//!     const RESOURCE_NAME: &'static str = "avatars";
//! }
//!
//! impl PayloadConvertible for Avatar {
//!     fn payload_dict(&self, _method: HttpMethod) -> PayloadDict {
//!         PayloadDict::new()
//!             .with("image", MultipartValue::new(self.image.clone(), ContentType::ImagePng))
//!     }
//! }
//!
//! impl SinglePostable for Avatar {}
//!
//! # async fn example() -> drf_consumer::Result<()> {
//! let node = Node::builder("https://api.example.com/v1/", HttpTransport::new()?)
//!     .route(Route::single_post::<Avatar>("avatars/")?)
//!     .build()?;
//!
//! let avatar = Avatar { id: None, image: vec![0x89, b'P', b'N', b'G'] };
//! let created = node.post(&avatar, Vec::new(), UnwrappedJson::new()).await?;
//! println!("created avatar {:?}", created.id);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`payload`]: Value model and the JSON/multipart merge engine
//! - [`node`]: Node, routes, filters, pagination, and TOML configuration
//! - [`resource`]: Capability traits, request flows, observers, and request handles
//! - [`transport`]: Transport abstraction and the reqwest-backed HTTP transport
//! - [`error`]: Error types with recovery guidance
//!
//! # Error Handling
//!
//! All operations return [`Result<T, ConsumerError>`](error::Result). Observers
//! receive the same error behind an [`Arc`](std::sync::Arc):
//!
//! ```rust
//! use drf_consumer::{ConsumerError, error::DecodeError};
//!
//! fn describe(error: &ConsumerError) -> &'static str {
//!     match error {
//!         ConsumerError::HttpError(_) => "network failure, retry at the call site",
//!         ConsumerError::Status { status: 400..=499, .. } => "request rejected by the backend",
//!         ConsumerError::Decode(DecodeError::ListElement { .. }) => "one result broke the page",
//!         ConsumerError::Decode(_) => "backend broke the envelope contract",
//!         ConsumerError::Cancelled => "cancelled through its handle",
//!         _ => "other failure",
//!     }
//! }
//!
//! assert_eq!(describe(&ConsumerError::Cancelled), "cancelled through its handle");
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and criterion"
)]

pub mod error;
pub mod node;
pub mod payload;
pub mod resource;
pub mod transport;

pub use error::{ConsumerError, DecodeError, Result};
pub use node::{Node, NodeBuilder, NodeConfig};
pub use payload::Payload;
