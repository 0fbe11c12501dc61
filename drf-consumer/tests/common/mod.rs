//! Shared fixtures: a recording transport, domain types, and recording observers.

#![allow(dead_code, reason = "each test binary uses a different subset of the fixtures")]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use drf_consumer::{
    error::Result,
    node::{HttpMethod, Node, Route},
    payload::{ContentType, MultipartValue, PayloadConvertible, PayloadDict},
    resource::{
        DetailFailure, DetailGettable, DetailGettableClient, FilteredListGettable, ListFailure,
        ListGettable, ListGettableClient, ListSuccess, PostFailure, Resource, SinglePostable,
        SinglePostableClient,
    },
    transport::{RequestConfiguration, Transport},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Notify;
use url::Url;

pub const BASE_URL: &str = "https://api.example.com/v1/";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Debug, Default)]
struct MockState {
    requests: Vec<RequestConfiguration>,
    responses: VecDeque<Result<Value>>,
}

/// Transport that records every request and answers from a queue.
///
/// An empty queue answers `null`. With a gate, every request waits until the
/// gate is opened.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    gate: Option<Arc<Notify>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self { gate: Some(gate), ..Self::default() }
    }

    pub fn respond(&self, response: Result<Value>) -> &Self {
        self.state.lock().unwrap().responses.push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<RequestConfiguration> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> RequestConfiguration {
        self.requests().pop().expect("no request was sent")
    }
}

impl Transport for MockTransport {
    async fn fire_json_request(&self, cfg: RequestConfiguration) -> Result<Value> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let mut state = self.state.lock().unwrap();
        state.requests.push(cfg);
        state.responses.pop_front().unwrap_or(Ok(Value::Null))
    }

    fn protocol_name(&self) -> &'static str {
        "mock"
    }
}

/// Records instance hook calls; shared between an instance and its clones.
#[derive(Debug, Clone, Default)]
pub struct HookLog(Arc<Mutex<Vec<String>>>);

impl HookLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(skip)]
    pub hooks: HookLog,
}

impl User {
    pub fn new(id: u64, username: &str) -> Self {
        Self { id, username: username.to_owned(), hooks: HookLog::default() }
    }
}

impl Resource for User {
    const RESOURCE_NAME: &'static str = "users";
}

impl ListGettable for User {}

impl DetailGettable for User {
    fn resource_id(&self) -> String {
        self.id.to_string()
    }

    fn got_new_self(&self, new_self: &Self, _base_url: &Url) {
        self.hooks.push(format!("got_new_self:{}", new_self.username));
    }

    fn failed_getting_new_self(
        &self,
        error: &Arc<drf_consumer::ConsumerError>,
        _base_url: &Url,
    ) {
        self.hooks.push(format!("failed_getting_new_self:{error}"));
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    pub id: u64,
    pub title: String,
}

impl Resource for Article {
    const RESOURCE_NAME: &'static str = "articles";
}

impl ListGettable for Article {}

impl FilteredListGettable for Article {}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub id: Option<u64>,
    pub text: String,
    #[serde(skip)]
    pub hooks: HookLog,
}

impl Comment {
    pub fn new(text: &str) -> Self {
        Self { id: None, text: text.to_owned(), hooks: HookLog::default() }
    }
}

impl Resource for Comment {
    const RESOURCE_NAME: &'static str = "comments";
}

impl PayloadConvertible for Comment {
    fn payload_dict(&self, _method: HttpMethod) -> PayloadDict {
        PayloadDict::new().with("text", self.text.as_str())
    }
}

impl SinglePostable for Comment {
    fn posted(&self, response: &Self, _base_url: &Url) {
        self.hooks.push(format!("posted:{:?}", response.id));
    }

    fn failed_posting(&self, error: &Arc<drf_consumer::ConsumerError>, _base_url: &Url) {
        self.hooks.push(format!("failed_posting:{error}"));
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub id: Option<u64>,
    pub caption: String,
    #[serde(skip)]
    pub image: Vec<u8>,
}

impl Resource for Photo {
    const RESOURCE_NAME: &'static str = "photos";
}

impl PayloadConvertible for Photo {
    fn payload_dict(&self, _method: HttpMethod) -> PayloadDict {
        PayloadDict::new()
            .with("caption", self.caption.as_str())
            .with("image", MultipartValue::new(self.image.clone(), ContentType::ImagePng))
    }
}

impl SinglePostable for Photo {}

pub fn node(transport: MockTransport) -> Node<MockTransport> {
    Node::builder(BASE_URL, transport)
        .route(Route::list_get::<User>("users/").unwrap())
        .route(Route::detail_get::<User>("users/{id}/").unwrap())
        .route(Route::list_get::<Article>("articles/").unwrap())
        .route(Route::single_post::<Comment>("comments/").unwrap())
        .route(Route::single_post::<Photo>("photos/").unwrap())
        .build()
        .unwrap()
}

pub fn envelope(limit: u64, offset: u64, total_count: u64, results: Value) -> Value {
    json!({
        "meta": {
            "limit": limit,
            "offset": offset,
            "total_count": total_count,
            "next": null,
            "previous": null
        },
        "results": results
    })
}

/// List observer recording every notification.
#[derive(Default)]
pub struct ListRecorder {
    pub successes: Mutex<Vec<(usize, ListSuccess)>>,
    pub failures: Mutex<Vec<ListFailure>>,
}

impl ListRecorder {
    pub fn success_count(&self) -> usize {
        self.successes.lock().unwrap().len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().unwrap().len()
    }
}

impl<T: ListGettable> ListGettableClient<T> for ListRecorder {
    fn got_objects(&self, objects: &[T], success: &ListSuccess) {
        self.successes.lock().unwrap().push((objects.len(), success.clone()));
    }

    fn failed_getting_objects(&self, failure: &ListFailure) {
        self.failures.lock().unwrap().push(failure.clone());
    }
}

/// Detail observer recording `(fresh, original)` pairs and failures.
pub struct DetailRecorder<T> {
    pub successes: Mutex<Vec<(T, T)>>,
    pub failures: Mutex<Vec<DetailFailure<T>>>,
}

impl<T> Default for DetailRecorder<T> {
    fn default() -> Self {
        Self { successes: Mutex::new(Vec::new()), failures: Mutex::new(Vec::new()) }
    }
}

impl<T: DetailGettable> DetailGettableClient<T> for DetailRecorder<T> {
    fn got_object(&self, object: &T, original: &T, _base_url: &Url) {
        self.successes.lock().unwrap().push((object.clone(), original.clone()));
    }

    fn failed_getting_object(&self, failure: &DetailFailure<T>) {
        self.failures.lock().unwrap().push(failure.clone());
    }
}

/// Post observer recording `(posted, response)` pairs and failures.
pub struct PostRecorder<T> {
    pub successes: Mutex<Vec<(T, T)>>,
    pub failures: Mutex<Vec<PostFailure<T>>>,
}

impl<T> Default for PostRecorder<T> {
    fn default() -> Self {
        Self { successes: Mutex::new(Vec::new()), failures: Mutex::new(Vec::new()) }
    }
}

impl<T: SinglePostable> SinglePostableClient<T> for PostRecorder<T> {
    fn posted_object(&self, object: &T, response: &T, _base_url: &Url) {
        self.successes.lock().unwrap().push((object.clone(), response.clone()));
    }

    fn failed_posting_object(&self, failure: &PostFailure<T>) {
        self.failures.lock().unwrap().push(failure.clone());
    }
}
