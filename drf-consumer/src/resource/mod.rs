//! Resource capabilities and the request flows behind them.
//!
//! A domain type opts into each capability separately:
//!
//! | Capability | Trait | Node operation | Observer |
//! |------------|-------|----------------|----------|
//! | list GET | [`ListGettable`] | [`Node::get_list`](crate::node::Node::get_list) | [`ListGettableClient`] |
//! | list GET with default filters | [`FilteredListGettable`] | [`Node::get_filtered_list`](crate::node::Node::get_filtered_list) | [`ListGettableClient`] |
//! | detail GET | [`DetailGettable`] | [`Node::get_detail`](crate::node::Node::get_detail) | [`DetailGettableClient`] |
//! | single POST | [`SinglePostable`] | [`Node::post`](crate::node::Node::post) | [`SinglePostableClient`] |
//!
//! Every request walks the same states: built, sent, then either succeeded and
//! decoded or failed, and finally dispatched to the observers attached to the
//! node's [`ClientRegistry`]. Nothing is retried.
//!
//! # Examples
//!
//! ```
//! use drf_consumer::resource::{ListGettable, Resource};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! impl Resource for User {
//!     const RESOURCE_NAME: &'static str = "users";
//! }
//!
//! impl ListGettable for User {}
//! ```

mod detail;
mod handle;
mod list;
mod post;
mod registry;

pub use detail::{DetailFailure, DetailGettable, DetailGettableClient};
pub use handle::RequestHandle;
pub use list::{
    FilteredListGettable, ListFailure, ListGettable, ListGettableClient, ListRequest,
    ListResponse, ListSuccess,
};
pub use post::{PostFailure, SinglePostable, SinglePostableClient};
pub use registry::{Capability, ClientId, ClientRegistry};

/// A backend resource type.
///
/// The name keys routes and per-resource node settings, and labels log events
/// and failure descriptors.
pub trait Resource {
    /// Resource name, e.g. `"users"`.
    const RESOURCE_NAME: &'static str;
}
