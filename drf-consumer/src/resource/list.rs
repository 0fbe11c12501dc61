//! List GET: paginated, filtered collection requests.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    error::{ConsumerError, Result},
    node::{Filter, HttpMethod, Node, Pagination, RouteKind},
    resource::{RequestHandle, Resource},
    transport::{RequestConfiguration, Transport},
};

/// A resource that can be fetched as a paginated list.
pub trait ListGettable: Resource + DeserializeOwned + Send + Sync + 'static {}

/// List resource the node keeps default filters for.
///
/// Only these types can be fetched through
/// [`Node::get_filtered_list`], which adds the defaults to the explicit filters.
///
/// # Examples
///
/// ```
/// use drf_consumer::resource::{FilteredListGettable, ListGettable, Resource};
///
/// #[derive(Debug, serde::Deserialize)]
/// struct Article {
///     title: String,
/// }
///
/// impl Resource for Article {
///     const RESOURCE_NAME: &'static str = "articles";
/// }
///
/// impl ListGettable for Article {}
///
/// impl FilteredListGettable for Article {}
/// ```
pub trait FilteredListGettable: ListGettable {}

/// Parameters of one list GET.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListRequest {
    /// Offset of the first requested object.
    pub offset: u64,
    /// Page size; `0` selects the node's default for the resource.
    pub limit: u64,
    /// Explicit filters.
    pub filters: Vec<Filter>,
}

impl ListRequest {
    /// First page at the node's default limit, unfiltered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the offset.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds several filters.
    #[must_use]
    pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.filters.extend(filters);
        self
    }
}

/// Delivered to observers when a list GET succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSuccess {
    /// Correlation id of the request.
    pub request_id: Uuid,
    /// Base URL of the node the request was issued against.
    pub base_url: Url,
    /// Pagination reported by the backend.
    pub response_pagination: Pagination,
    /// Requested offset.
    pub offset: u64,
    /// Requested limit, after applying the node default.
    pub limit: u64,
    /// Filters the request was sent with.
    pub filters: Vec<Filter>,
}

/// Delivered to observers when a list GET fails.
#[derive(Debug, Clone)]
pub struct ListFailure {
    /// Correlation id of the request.
    pub request_id: Uuid,
    /// Name of the requested resource.
    pub resource: &'static str,
    /// Base URL of the node the request was issued against.
    pub base_url: Url,
    /// The failure, shared by every observer.
    pub error: Arc<ConsumerError>,
    /// Requested offset.
    pub offset: u64,
    /// Requested limit, after applying the node default.
    pub limit: u64,
    /// Filters the request was sent with.
    pub filters: Vec<Filter>,
}

#[cfg(test)]
impl ListFailure {
    pub(crate) fn for_test<T: Resource>() -> Self {
        Self {
            request_id: Uuid::nil(),
            resource: T::RESOURCE_NAME,
            base_url: Url::parse("https://api.example.com/").unwrap(),
            error: Arc::new(ConsumerError::Cancelled),
            offset: 0,
            limit: 0,
            filters: Vec::new(),
        }
    }
}

/// Decoded objects of a successful list GET.
#[derive(Debug, Clone)]
pub struct ListResponse<R> {
    /// Objects in the order of the `results` array.
    pub objects: Vec<R>,
    /// Descriptor the observers received.
    pub success: ListSuccess,
}

/// Observer of list GETs of `T`.
pub trait ListGettableClient<T: ListGettable>: Send + Sync {
    /// Called once per successful request.
    fn got_objects(&self, objects: &[T], success: &ListSuccess);

    /// Called once per failed request.
    fn failed_getting_objects(&self, failure: &ListFailure);
}

/// Request-scoped values shared by the perform and dispatch steps.
#[derive(Debug)]
struct ListCall {
    request_id: Uuid,
    offset: u64,
    limit: u64,
    filters: Vec<Filter>,
}

impl<T: Transport> Node<T> {
    /// Fetches one page of `R`.
    ///
    /// A `limit` of `0` is replaced by the node's default for the resource.
    /// Every attached [`ListGettableClient`] of `R` is notified exactly once,
    /// on success or on failure.
    ///
    /// # Errors
    ///
    /// Returns the same error the observers received: a missing route, a
    /// transport failure, or a [`DecodeError`](crate::error::DecodeError) if
    /// the envelope or any result fails to decode.
    pub async fn get_list<R: ListGettable>(&self, request: ListRequest) -> Result<ListResponse<R>> {
        let call = self.list_call::<R>(request, &[]);
        let outcome = self.perform_list::<R>(&call).await;
        self.dispatch_list(call, outcome)
    }

    /// Fetches one page of `R` with the node's default filters for it added.
    ///
    /// An explicit filter replaces the default filter with the same key.
    /// Otherwise behaves like [`get_list`](Self::get_list).
    ///
    /// # Errors
    ///
    /// See [`get_list`](Self::get_list).
    pub async fn get_filtered_list<R: FilteredListGettable>(
        &self,
        request: ListRequest,
    ) -> Result<ListResponse<R>> {
        let call = self.list_call::<R>(request, self.default_filters_for::<R>());
        let outcome = self.perform_list::<R>(&call).await;
        self.dispatch_list(call, outcome)
    }

    /// Fetches one page of `R` on a new task.
    ///
    /// Behaves like [`get_list`](Self::get_list); cancelling the handle before
    /// the response is dispatched notifies nobody.
    pub fn spawn_get_list<R: ListGettable>(
        self: &Arc<Self>,
        request: ListRequest,
    ) -> RequestHandle<ListResponse<R>>
    where
        T: 'static,
    {
        let call = self.list_call::<R>(request, &[]);
        self.spawn_list_call(call)
    }

    /// Fetches one page of `R` with its default filters on a new task.
    ///
    /// Behaves like [`get_filtered_list`](Self::get_filtered_list).
    pub fn spawn_get_filtered_list<R: FilteredListGettable>(
        self: &Arc<Self>,
        request: ListRequest,
    ) -> RequestHandle<ListResponse<R>>
    where
        T: 'static,
    {
        let call = self.list_call::<R>(request, self.default_filters_for::<R>());
        self.spawn_list_call(call)
    }

    fn spawn_list_call<R: ListGettable>(
        self: &Arc<Self>,
        call: ListCall,
    ) -> RequestHandle<ListResponse<R>>
    where
        T: 'static,
    {
        let node = Arc::clone(self);

        RequestHandle::spawn(call.request_id, move |token| async move {
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => return Err(ConsumerError::Cancelled),
                outcome = node.perform_list::<R>(&call) => outcome,
            };
            if token.is_cancelled() {
                return Err(ConsumerError::Cancelled);
            }
            node.dispatch_list(call, outcome)
        })
    }

    fn list_call<R: ListGettable>(&self, request: ListRequest, defaults: &[Filter]) -> ListCall {
        let limit =
            if request.limit > 0 { request.limit } else { self.default_limit(R::RESOURCE_NAME) };

        let mut filters = request.filters;
        let defaults = defaults
            .iter()
            .filter(|d| filters.iter().all(|f| f.string_key() != d.string_key()))
            .cloned()
            .collect::<Vec<_>>();
        filters.extend(defaults);

        ListCall { request_id: Uuid::new_v4(), offset: request.offset, limit, filters }
    }

    #[instrument(
        skip(self, call),
        fields(resource = R::RESOURCE_NAME, request_id = %call.request_id)
    )]
    async fn perform_list<R: ListGettable>(&self, call: &ListCall) -> Result<(Pagination, Vec<R>)> {
        let url = self.absolute_url(R::RESOURCE_NAME, RouteKind::List, HttpMethod::Get)?;
        let parameters = self.parameters_from(call.offset, call.limit, &call.filters);

        debug!(
            %url,
            offset = call.offset,
            limit = call.limit,
            filters = call.filters.len(),
            "list request built"
        );

        let cfg = RequestConfiguration::new(url, HttpMethod::Get).with_parameters(parameters);
        let json = self.fire_json_request(cfg).await?;
        self.extract_list_response::<R>(&json)
    }

    fn dispatch_list<R: ListGettable>(
        &self,
        call: ListCall,
        outcome: Result<(Pagination, Vec<R>)>,
    ) -> Result<ListResponse<R>> {
        let clients = self.clients().list_clients::<R>();

        match outcome {
            Ok((response_pagination, objects)) => {
                info!(
                    resource = R::RESOURCE_NAME,
                    request_id = %call.request_id,
                    count = objects.len(),
                    total_count = response_pagination.total_count,
                    observers = clients.len(),
                    "list request succeeded"
                );
                let success = ListSuccess {
                    request_id: call.request_id,
                    base_url: self.base_url().clone(),
                    response_pagination,
                    offset: call.offset,
                    limit: call.limit,
                    filters: call.filters,
                };
                for client in &clients {
                    client.got_objects(&objects, &success);
                }
                Ok(ListResponse { objects, success })
            }
            Err(error) => {
                warn!(
                    resource = R::RESOURCE_NAME,
                    request_id = %call.request_id,
                    error = %error,
                    observers = clients.len(),
                    "list request failed"
                );
                let failure = ListFailure {
                    request_id: call.request_id,
                    resource: R::RESOURCE_NAME,
                    base_url: self.base_url().clone(),
                    error: Arc::new(error),
                    offset: call.offset,
                    limit: call.limit,
                    filters: call.filters,
                };
                for client in &clients {
                    client.failed_getting_objects(&failure);
                }
                Err((*failure.error).clone())
            }
        }
    }
}
