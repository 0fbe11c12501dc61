//! Integration tests for list GETs.
//!
//! Tests query composition, envelope decoding, and observer fan-out against a
//! recording transport.

mod common;

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, OnceLock},
};

use common::{Article, ListRecorder, MockTransport, User, envelope, init_tracing, node};
use drf_consumer::{
    ConsumerError, DecodeError,
    node::{Comparator, Filter, HttpMethod, Node, RouteKind},
    resource::{Capability, ClientId, ClientRegistry, ListFailure, ListGettableClient, ListRequest, ListSuccess},
    transport::ParameterEncoding,
};
use serde_json::json;

fn query(transport: &MockTransport) -> BTreeMap<String, String> {
    transport.last_request().query_pairs().into_iter().collect()
}

#[tokio::test]
async fn test_list_uses_default_limit_and_reports_backend_pagination() {
    init_tracing();
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(
        200,
        0,
        2,
        json!([{"id": 1, "username": "ana"}, {"id": 2, "username": "ben"}]),
    )));
    let node = node(transport.clone());

    let page = node.get_list::<User>(ListRequest::new()).await.expect("list should succeed");

    assert_eq!(page.objects.len(), 2);
    assert_eq!(page.objects[1].username, "ben");
    assert_eq!(page.success.offset, 0);
    assert_eq!(page.success.limit, 1000);
    assert_eq!(page.success.response_pagination.limit, 200);
    assert_eq!(page.success.response_pagination.total_count, 2);

    let request = transport.last_request();
    assert_eq!(request.url.as_str(), "https://api.example.com/v1/users/");
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.encoding, ParameterEncoding::Url);

    let query = query(&transport);
    assert_eq!(query.get("offset").map(String::as_str), Some("0"));
    assert_eq!(query.get("limit").map(String::as_str), Some("1000"));
    assert_eq!(query.len(), 2);
}

#[tokio::test]
async fn test_list_composes_page_and_filters() {
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(25, 50, 0, json!([]))));
    let node = node(transport.clone());

    let page = node
        .get_list::<User>(
            ListRequest::new()
                .offset(50)
                .limit(25)
                .filter(Filter::new("username", Comparator::IStartsWith, "a"))
                .filter(Filter::new("id", Comparator::In, vec![1u32, 2, 3])),
        )
        .await
        .expect("list should succeed");

    assert!(page.objects.is_empty());
    assert_eq!(page.success.filters.len(), 2);

    let query = query(&transport);
    assert_eq!(query.get("offset").map(String::as_str), Some("50"));
    assert_eq!(query.get("limit").map(String::as_str), Some("25"));
    assert_eq!(query.get("username__istartswith").map(String::as_str), Some("a"));
    assert_eq!(query.get("id__in").map(String::as_str), Some("1,2,3"));
}

#[tokio::test]
async fn test_filtered_list_adds_default_filters() {
    let transport = MockTransport::new();
    let node = Node::builder(common::BASE_URL, transport.clone())
        .route(drf_consumer::node::Route::list_get::<Article>("articles/").unwrap())
        .default_filters_for("articles", [Filter::new("published", Comparator::Exact, true)])
        .build()
        .unwrap();

    transport.respond(Ok(envelope(1000, 0, 0, json!([]))));
    node.get_list::<Article>(ListRequest::new()).await.unwrap();
    assert!(!query(&transport).contains_key("published"));

    transport.respond(Ok(envelope(1000, 0, 0, json!([]))));
    let page = node.get_filtered_list::<Article>(ListRequest::new()).await.unwrap();
    assert_eq!(query(&transport).get("published").map(String::as_str), Some("true"));
    assert_eq!(page.success.filters, vec![Filter::new("published", Comparator::Exact, true)]);
    assert_eq!(node.default_filters_for::<Article>().len(), 1);
}

#[tokio::test]
async fn test_explicit_filter_beats_default_with_same_key() {
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(1000, 0, 0, json!([]))));
    let node = Node::builder(common::BASE_URL, transport.clone())
        .route(drf_consumer::node::Route::list_get::<Article>("articles/").unwrap())
        .default_filters_for(
            "articles",
            [
                Filter::new("published", Comparator::Exact, true),
                Filter::new("lang", Comparator::Exact, "en"),
            ],
        )
        .build()
        .unwrap();

    let page = node
        .get_filtered_list::<Article>(
            ListRequest::new().filter(Filter::new("published", Comparator::Exact, false)),
        )
        .await
        .unwrap();

    let query = query(&transport);
    assert_eq!(query.get("published").map(String::as_str), Some("false"));
    assert_eq!(query.get("lang").map(String::as_str), Some("en"));
    assert_eq!(page.success.filters.len(), 2);
}

#[tokio::test]
async fn test_plain_list_never_adds_default_filters() {
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(1000, 0, 0, json!([]))));
    let node = Node::builder(common::BASE_URL, transport.clone())
        .route(drf_consumer::node::Route::list_get::<User>("users/").unwrap())
        .default_filters_for("users", [Filter::new("is_active", Comparator::Exact, true)])
        .build()
        .unwrap();

    node.get_list::<User>(ListRequest::new()).await.unwrap();
    assert!(!query(&transport).contains_key("is_active"));
}

#[tokio::test]
async fn test_spawned_filtered_list_adds_default_filters() {
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(1000, 0, 0, json!([]))));
    let node = Arc::new(
        Node::builder(common::BASE_URL, transport.clone())
            .route(drf_consumer::node::Route::list_get::<Article>("articles/").unwrap())
            .default_filters_for("articles", [Filter::new("lang", Comparator::Exact, "de")])
            .build()
            .unwrap(),
    );

    let page = node
        .spawn_get_filtered_list::<Article>(ListRequest::new().limit(10))
        .outcome()
        .await
        .unwrap();

    assert_eq!(page.success.limit, 10);
    assert_eq!(query(&transport).get("lang").map(String::as_str), Some("de"));
}

#[tokio::test]
async fn test_success_notifies_each_observer_once() {
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(1000, 0, 1, json!([{"id": 7, "username": "gus"}]))));
    let node = node(transport);
    let first = Arc::new(ListRecorder::default());
    let second = Arc::new(ListRecorder::default());
    node.clients().attach_list_client::<User>(first.clone());
    node.clients().attach_list_client::<User>(second.clone());

    let page = node.get_list::<User>(ListRequest::new()).await.unwrap();

    for recorder in [&first, &second] {
        assert_eq!(recorder.success_count(), 1);
        assert_eq!(recorder.failure_count(), 0);
        let successes = recorder.successes.lock().unwrap();
        assert_eq!(successes[0].0, 1);
        assert_eq!(successes[0].1, page.success);
    }
}

#[tokio::test]
async fn test_failure_shares_one_error_between_observers() {
    let transport = MockTransport::new();
    transport.respond(Err(ConsumerError::Status { status: 503, body: "down".to_owned() }));
    let node = node(transport);
    let first = Arc::new(ListRecorder::default());
    let second = Arc::new(ListRecorder::default());
    node.clients().attach_list_client::<User>(first.clone());
    node.clients().attach_list_client::<User>(second.clone());

    let filter = Filter::new("username", Comparator::Contains, "x");
    let result = node.get_list::<User>(ListRequest::new().limit(5).filter(filter.clone())).await;

    assert!(matches!(result, Err(ConsumerError::Status { status: 503, .. })));
    assert_eq!(first.success_count(), 0);
    assert_eq!(first.failure_count(), 1);
    assert_eq!(second.failure_count(), 1);

    let a = first.failures.lock().unwrap()[0].clone();
    let b = second.failures.lock().unwrap()[0].clone();
    assert!(Arc::ptr_eq(&a.error, &b.error));
    assert_eq!(a.request_id, b.request_id);
    assert_eq!(a.resource, "users");
    assert_eq!(a.limit, 5);
    assert_eq!(a.filters, vec![filter]);
}

#[tokio::test]
async fn test_one_bad_result_fails_the_page() {
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(
        1000,
        0,
        2,
        json!([{"id": 1, "username": "ana"}, {"id": "two", "username": "ben"}]),
    )));
    let node = node(transport);
    let recorder = Arc::new(ListRecorder::default());
    node.clients().attach_list_client::<User>(recorder.clone());

    let result = node.get_list::<User>(ListRequest::new()).await;

    match result {
        Err(ConsumerError::Decode(DecodeError::ListElement { index, resource, .. })) => {
            assert_eq!(index, 1);
            assert_eq!(resource, "users");
        }
        other => panic!("expected a list element error, got {other:?}"),
    }
    assert_eq!(recorder.success_count(), 0);
    assert_eq!(recorder.failure_count(), 1);
}

#[tokio::test]
async fn test_missing_results_is_a_decode_error() {
    let transport = MockTransport::new();
    transport.respond(Ok(json!({"meta": {"limit": 1, "offset": 0, "total_count": 0}})));
    let node = node(transport);

    let result = node.get_list::<User>(ListRequest::new()).await;
    assert!(matches!(result, Err(ConsumerError::Decode(DecodeError::MissingField(_)))));
}

#[tokio::test]
async fn test_unknown_route_fails_without_sending() {
    let transport = MockTransport::new();
    let node = Node::builder(common::BASE_URL, transport.clone()).build().unwrap();
    let recorder = Arc::new(ListRecorder::default());
    node.clients().attach_list_client::<Article>(recorder.clone());

    let result = node.get_list::<Article>(ListRequest::new()).await;

    match result {
        Err(ConsumerError::UnknownRoute { resource, kind, method }) => {
            assert_eq!(resource, "articles");
            assert_eq!(kind, RouteKind::List);
            assert_eq!(method, HttpMethod::Get);
        }
        other => panic!("expected an unknown route error, got {other:?}"),
    }
    assert!(transport.requests().is_empty());
    assert_eq!(recorder.failure_count(), 1);
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(1000, 0, 0, json!([]))));
    let node = Node::builder(common::BASE_URL, transport.clone())
        .route(drf_consumer::node::Route::list_get::<User>("users/").unwrap())
        .default_header("Authorization", "Token abc")
        .build()
        .unwrap();

    node.get_list::<User>(ListRequest::new()).await.unwrap();

    assert_eq!(
        transport.last_request().headers,
        vec![("Authorization".to_owned(), "Token abc".to_owned())]
    );
}

#[tokio::test]
async fn test_detached_observer_is_not_notified() {
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(1000, 0, 0, json!([]))));
    let node = node(transport);
    let kept = Arc::new(ListRecorder::default());
    let dropped = Arc::new(ListRecorder::default());
    node.clients().attach_list_client::<User>(kept.clone());
    let id = node.clients().attach_list_client::<User>(dropped.clone());

    assert!(node.clients().detach(id));
    assert_eq!(node.clients().client_count::<User>(Capability::ListGet), 1);

    node.get_list::<User>(ListRequest::new()).await.unwrap();
    assert_eq!(kept.success_count(), 1);
    assert_eq!(dropped.success_count(), 0);
}

/// Observer that detaches itself on its first notification.
struct OneShot {
    registry: Arc<ClientRegistry>,
    id: OnceLock<ClientId>,
    calls: Mutex<u32>,
}

impl ListGettableClient<User> for OneShot {
    fn got_objects(&self, _objects: &[User], _success: &ListSuccess) {
        *self.calls.lock().unwrap() += 1;
        if let Some(id) = self.id.get() {
            self.registry.detach(*id);
        }
    }

    fn failed_getting_objects(&self, _failure: &ListFailure) {}
}

#[tokio::test]
async fn test_observer_can_detach_during_notification() {
    let transport = MockTransport::new();
    transport.respond(Ok(envelope(1000, 0, 0, json!([]))));
    transport.respond(Ok(envelope(1000, 0, 0, json!([]))));
    let node = node(transport);

    let observer = Arc::new(OneShot {
        registry: Arc::clone(node.clients()),
        id: OnceLock::new(),
        calls: Mutex::new(0),
    });
    let id = node.clients().attach_list_client::<User>(observer.clone());
    observer.id.set(id).unwrap();

    node.get_list::<User>(ListRequest::new()).await.unwrap();
    node.get_list::<User>(ListRequest::new()).await.unwrap();

    assert_eq!(*observer.calls.lock().unwrap(), 1);
    assert!(node.clients().is_empty());
}
