//! Cancellable handles for spawned requests.

use std::{any::Any, fmt, future::Future};

use tokio::{sync::oneshot, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ConsumerError, Result};

/// Handle to a request running on its own task.
///
/// The request completes on the task, notifies its observers, and delivers
/// its result through the handle. Cancelling before the response has been
/// dispatched stops the request without notifying anyone; cancelling later
/// has no effect on the outcome.
///
/// Dropping the handle detaches the task, which then runs to completion.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use drf_consumer::{
///     error::ConsumerError,
///     node::Node,
///     resource::{ListGettable, ListRequest, Resource},
///     transport::HttpTransport,
/// };
///
/// #[derive(Debug, serde::Deserialize)]
/// struct User {
///     id: u64,
/// }
///
/// impl Resource for User {
///     const RESOURCE_NAME: &'static str = "users";
/// }
///
/// impl ListGettable for User {}
///
/// # async fn example(node: Arc<Node<HttpTransport>>) {
/// let handle = node.spawn_get_list::<User>(ListRequest::new());
/// handle.cancel();
///
/// assert!(matches!(handle.outcome().await, Err(ConsumerError::Cancelled) | Ok(_)));
/// # }
/// ```
pub struct RequestHandle<T> {
    request_id: Uuid,
    token: CancellationToken,
    receiver: oneshot::Receiver<Result<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> RequestHandle<T> {
    /// Spawns the future built by `request` and wires its result to the handle.
    ///
    /// `request` receives the cancellation token; the future it returns is
    /// responsible for checking it before dispatching.
    pub(crate) fn spawn<F, Fut>(request_id: Uuid, request: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let (sender, receiver) = oneshot::channel();
        let future = request(token.clone());

        let task = tokio::spawn(async move {
            // The handle may have been dropped already.
            let _ = sender.send(future.await);
        });

        Self { request_id, token, receiver, task }
    }
}

impl<T> RequestHandle<T> {
    /// Correlation id of the request, also recorded on its log events.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns true once the request task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the request and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumerError::Cancelled`] if the request was cancelled
    /// before dispatch, [`ConsumerError::TaskPanicked`] if its task panicked,
    /// otherwise the error the request failed with.
    pub async fn outcome(self) -> Result<T> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            // The sender only drops unsent when the task unwinds or is aborted.
            Err(_) => match self.task.await {
                Err(error) if error.is_panic() => {
                    Err(ConsumerError::TaskPanicked(panic_message(error.into_panic())))
                }
                _ => Err(ConsumerError::Cancelled),
            },
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

impl<T> fmt::Debug for RequestHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("request_id", &self.request_id)
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_outcome_delivers_result() {
        let id = Uuid::new_v4();
        let handle = RequestHandle::spawn(id, |_token| async { Ok::<_, ConsumerError>(42u32) });
        assert_eq!(handle.request_id(), id);
        assert_eq!(handle.outcome().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_outcome_delivers_error() {
        let handle = RequestHandle::<u32>::spawn(Uuid::new_v4(), |_token| async {
            Err::<u32, _>(ConsumerError::InvalidInput("bad".to_owned()))
        });
        assert!(matches!(handle.outcome().await, Err(ConsumerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_cancel_before_completion() {
        let handle = RequestHandle::<u32>::spawn(Uuid::new_v4(), |token| async move {
            tokio::select! {
                () = token.cancelled() => Err(ConsumerError::Cancelled),
                () = tokio::time::sleep(Duration::from_secs(60)) => Ok::<u32, ConsumerError>(1),
            }
        });

        assert!(!handle.is_cancelled());
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(matches!(handle.outcome().await, Err(ConsumerError::Cancelled)));
    }

    #[tokio::test]
    async fn test_panicking_task_is_not_reported_as_cancelled() {
        let handle = RequestHandle::<u32>::spawn(Uuid::new_v4(), |_token| async {
            let observer_failed = true;
            if observer_failed {
                panic!("observer exploded");
            }
            Ok::<u32, ConsumerError>(1)
        });

        match handle.outcome().await {
            Err(ConsumerError::TaskPanicked(message)) => assert_eq!(message, "observer exploded"),
            other => panic!("expected a panic report, got {other:?}"),
        }
    }

    #[test]
    fn test_panic_message_formats() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(7u8)), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_debug_format() {
        let handle =
            RequestHandle::spawn(Uuid::new_v4(), |_token| async { Ok::<_, ConsumerError>(()) });
        let debug_str = format!("{handle:?}");
        assert!(debug_str.contains("RequestHandle"));
        assert!(debug_str.contains("cancelled: false"));
    }
}
