//! Detail GET: re-fetching one object by its identity.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    error::{ConsumerError, Result},
    node::{HttpMethod, Node},
    resource::{RequestHandle, Resource},
    transport::{RequestConfiguration, Transport},
};

/// A resource that can be re-fetched from its detail route.
///
/// # Examples
///
/// ```
/// use drf_consumer::resource::{DetailGettable, Resource};
///
/// #[derive(Debug, Clone, serde::Deserialize)]
/// struct Order {
///     id: u64,
///     status: String,
/// }
///
/// impl Resource for Order {
///     const RESOURCE_NAME: &'static str = "orders";
/// }
///
/// impl DetailGettable for Order {
///     fn resource_id(&self) -> String {
///         self.id.to_string()
///     }
/// }
/// ```
pub trait DetailGettable: Resource + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Identity substituted into the detail route.
    fn resource_id(&self) -> String;

    /// Called on the original instance after a successful re-fetch.
    fn got_new_self(&self, _new_self: &Self, _base_url: &Url) {}

    /// Called on the original instance after a failed re-fetch.
    fn failed_getting_new_self(&self, _error: &Arc<ConsumerError>, _base_url: &Url) {}
}

/// Delivered to observers when a detail GET fails.
#[derive(Debug, Clone)]
pub struct DetailFailure<T> {
    /// Correlation id of the request.
    pub request_id: Uuid,
    /// Name of the requested resource.
    pub resource: &'static str,
    /// Base URL of the node the request was issued against.
    pub base_url: Url,
    /// Instance the request was made for.
    pub original: T,
    /// The failure, shared by every observer and the instance hook.
    pub error: Arc<ConsumerError>,
}

/// Observer of detail GETs of `T`.
pub trait DetailGettableClient<T: DetailGettable>: Send + Sync {
    /// Called once per successful request with the fresh and the original instance.
    fn got_object(&self, object: &T, original: &T, base_url: &Url);

    /// Called once per failed request.
    fn failed_getting_object(&self, failure: &DetailFailure<T>);
}

impl<T: Transport> Node<T> {
    /// Re-fetches `object` from its detail route.
    ///
    /// Observers are notified first, then the instance hooks
    /// [`got_new_self`](DetailGettable::got_new_self) or
    /// [`failed_getting_new_self`](DetailGettable::failed_getting_new_self).
    ///
    /// # Errors
    ///
    /// Returns the error the observers received: a missing route, an
    /// unusable identity, a transport failure, or a decode failure.
    pub async fn get_detail<R: DetailGettable>(&self, object: &R) -> Result<R> {
        let request_id = Uuid::new_v4();
        let outcome = self.perform_detail(request_id, object).await;
        self.dispatch_detail(request_id, object, outcome)
    }

    /// Re-fetches `object` on a new task.
    ///
    /// Cancelling the handle before the response is dispatched notifies nobody.
    pub fn spawn_get_detail<R: DetailGettable>(self: &Arc<Self>, object: R) -> RequestHandle<R>
    where
        T: 'static,
    {
        let node = Arc::clone(self);
        let request_id = Uuid::new_v4();

        RequestHandle::spawn(request_id, move |token| async move {
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => return Err(ConsumerError::Cancelled),
                outcome = node.perform_detail(request_id, &object) => outcome,
            };
            if token.is_cancelled() {
                return Err(ConsumerError::Cancelled);
            }
            node.dispatch_detail(request_id, &object, outcome)
        })
    }

    #[instrument(skip(self, object), fields(resource = R::RESOURCE_NAME, %request_id))]
    async fn perform_detail<R: DetailGettable>(&self, request_id: Uuid, object: &R) -> Result<R> {
        let method = HttpMethod::Get;
        let url = self.absolute_detail_url(R::RESOURCE_NAME, method, &object.resource_id())?;
        debug!(%url, "detail request built");

        let json = self.fire_json_request(RequestConfiguration::new(url, method)).await?;
        self.extract_single_object::<R>(json)
    }

    fn dispatch_detail<R: DetailGettable>(
        &self,
        request_id: Uuid,
        original: &R,
        outcome: Result<R>,
    ) -> Result<R> {
        let clients = self.clients().detail_clients::<R>();
        let base_url = self.base_url();

        match outcome {
            Ok(object) => {
                info!(
                    resource = R::RESOURCE_NAME,
                    %request_id,
                    observers = clients.len(),
                    "detail request succeeded"
                );
                for client in &clients {
                    client.got_object(&object, original, base_url);
                }
                original.got_new_self(&object, base_url);
                Ok(object)
            }
            Err(error) => {
                warn!(
                    resource = R::RESOURCE_NAME,
                    %request_id,
                    error = %error,
                    observers = clients.len(),
                    "detail request failed"
                );
                let failure = DetailFailure {
                    request_id,
                    resource: R::RESOURCE_NAME,
                    base_url: base_url.clone(),
                    original: original.clone(),
                    error: Arc::new(error),
                };
                for client in &clients {
                    client.failed_getting_object(&failure);
                }
                original.failed_getting_new_self(&failure.error, base_url);
                Err((*failure.error).clone())
            }
        }
    }
}
