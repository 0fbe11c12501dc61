//! Single POST: creating one object from its rendered payload.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    error::{ConsumerError, Result},
    node::{HttpMethod, Node, RouteKind},
    payload::{DefaultConversion, PayloadConversion, PayloadConvertible, UnwrappedJson},
    resource::{RequestHandle, Resource},
    transport::{RequestConfiguration, Transport},
};

/// A resource that can be created with a POST to its single-post route.
///
/// The instance is rendered through [`PayloadConvertible`]; the response is
/// decoded into a fresh instance carrying the server-assigned fields.
///
/// # Examples
///
/// ```
/// use drf_consumer::{
///     node::HttpMethod,
///     payload::{PayloadConvertible, PayloadDict},
///     resource::{Resource, SinglePostable},
/// };
///
/// #[derive(Debug, Clone, serde::Deserialize)]
/// struct Comment {
///     id: Option<u64>,
///     text: String,
/// }
///
/// impl Resource for Comment {
///     const RESOURCE_NAME: &'static str = "comments";
/// }
///
/// impl PayloadConvertible for Comment {
///     fn payload_dict(&self, _method: HttpMethod) -> PayloadDict {
///         PayloadDict::new().with("text", self.text.as_str())
///     }
/// }
///
/// impl SinglePostable for Comment {}
/// ```
pub trait SinglePostable:
    Resource + DeserializeOwned + PayloadConvertible + Clone + Send + Sync + 'static
{
    /// Conversion applied while rendering the POST payload.
    fn post_conversion(&self) -> &dyn PayloadConversion {
        &DefaultConversion
    }

    /// Called on the posted instance with the decoded response.
    fn posted(&self, _response: &Self, _base_url: &Url) {}

    /// Called on the posted instance after a failed POST.
    fn failed_posting(&self, _error: &Arc<ConsumerError>, _base_url: &Url) {}
}

/// Delivered to observers when a single POST fails.
#[derive(Debug, Clone)]
pub struct PostFailure<T> {
    /// Correlation id of the request.
    pub request_id: Uuid,
    /// Name of the posted resource.
    pub resource: &'static str,
    /// Base URL of the node the request was issued against.
    pub base_url: Url,
    /// Instance that was posted.
    pub object: T,
    /// The failure, shared by every observer and the instance hook.
    pub error: Arc<ConsumerError>,
}

/// Observer of single POSTs of `T`.
pub trait SinglePostableClient<T: SinglePostable>: Send + Sync {
    /// Called once per successful request with the posted instance and the response.
    fn posted_object(&self, object: &T, response: &T, base_url: &Url);

    /// Called once per failed request.
    fn failed_posting_object(&self, failure: &PostFailure<T>);
}

/// Extra request data sent along with the rendered payload.
#[derive(Debug, Default)]
struct PostExtras {
    headers: Vec<(String, String)>,
    parameters: UnwrappedJson,
}

impl<T: Transport> Node<T> {
    /// Posts `object` to its single-post route.
    ///
    /// The body is the rendered payload with `additional_parameters` written
    /// over it; it is sent as multipart when the payload holds binary parts
    /// and as JSON otherwise. `additional_headers` are sent after the node's
    /// default headers.
    ///
    /// # Errors
    ///
    /// Returns the error the observers received: a missing route, a
    /// transport failure, or a decode failure of the response.
    pub async fn post<R: SinglePostable>(
        &self,
        object: &R,
        additional_headers: Vec<(String, String)>,
        additional_parameters: UnwrappedJson,
    ) -> Result<R> {
        let request_id = Uuid::new_v4();
        let extras =
            PostExtras { headers: additional_headers, parameters: additional_parameters };
        let outcome = self.perform_post(request_id, object, extras).await;
        self.dispatch_post(request_id, object, outcome)
    }

    /// Posts `object` on a new task.
    ///
    /// Cancelling the handle before the response is dispatched notifies nobody.
    /// The request may still have reached the backend.
    pub fn spawn_post<R: SinglePostable>(
        self: &Arc<Self>,
        object: R,
        additional_headers: Vec<(String, String)>,
        additional_parameters: UnwrappedJson,
    ) -> RequestHandle<R>
    where
        T: 'static,
    {
        let node = Arc::clone(self);
        let request_id = Uuid::new_v4();
        let extras =
            PostExtras { headers: additional_headers, parameters: additional_parameters };

        RequestHandle::spawn(request_id, move |token| async move {
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => return Err(ConsumerError::Cancelled),
                outcome = node.perform_post(request_id, &object, extras) => outcome,
            };
            if token.is_cancelled() {
                return Err(ConsumerError::Cancelled);
            }
            node.dispatch_post(request_id, &object, outcome)
        })
    }

    #[instrument(skip(self, object, extras), fields(resource = R::RESOURCE_NAME, %request_id))]
    async fn perform_post<R: SinglePostable>(
        &self,
        request_id: Uuid,
        object: &R,
        extras: PostExtras,
    ) -> Result<R> {
        let method = HttpMethod::Post;
        let url = self.absolute_url(R::RESOURCE_NAME, RouteKind::Detail, method)?;

        let payload = object.to_payload(object.post_conversion(), method);
        let cfg = RequestConfiguration::for_payload(url, &payload, extras.parameters)
            .with_headers(extras.headers);

        debug!(
            url = %cfg.url,
            encoding = ?cfg.encoding,
            fields = cfg.parameters.len(),
            parts = cfg.parts.len(),
            "post request built"
        );

        let json = self.fire_json_request(cfg).await?;
        self.extract_single_object::<R>(json)
    }

    fn dispatch_post<R: SinglePostable>(
        &self,
        request_id: Uuid,
        object: &R,
        outcome: Result<R>,
    ) -> Result<R> {
        let clients = self.clients().post_clients::<R>();
        let base_url = self.base_url();

        match outcome {
            Ok(response) => {
                info!(
                    resource = R::RESOURCE_NAME,
                    %request_id,
                    observers = clients.len(),
                    "post request succeeded"
                );
                for client in &clients {
                    client.posted_object(object, &response, base_url);
                }
                object.posted(&response, base_url);
                Ok(response)
            }
            Err(error) => {
                warn!(
                    resource = R::RESOURCE_NAME,
                    %request_id,
                    error = %error,
                    observers = clients.len(),
                    "post request failed"
                );
                let failure = PostFailure {
                    request_id,
                    resource: R::RESOURCE_NAME,
                    base_url: base_url.clone(),
                    object: object.clone(),
                    error: Arc::new(error),
                };
                for client in &clients {
                    client.failed_posting_object(&failure);
                }
                object.failed_posting(&failure.error, base_url);
                Err((*failure.error).clone())
            }
        }
    }
}
