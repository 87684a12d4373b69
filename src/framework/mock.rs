//! # Mock Store
//!
//! Utilities for testing store-dependent code without spawning a real
//! [`ResourceActor`](crate::framework::ResourceActor).
//!
//! [`MockClient`] hands out a normal [`ResourceClient`] whose requests are
//! answered, in order, from a queue of expectations. Code under test cannot
//! tell the difference, which makes it easy to inject store failures that a
//! real actor would never produce.

use crate::framework::{ActorEntity, FrameworkError, ResourceClient, ResourceRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// One expected request and the canned reply for it.
enum Expectation<T: ActorEntity> {
    Create(Result<T, FrameworkError>),
    Get(Result<Option<T>, FrameworkError>),
    GetMany(Result<Vec<T>, FrameworkError>),
    Query(Result<Vec<T>, FrameworkError>),
    Update(Result<T, FrameworkError>),
    Action(Result<T::ActionResult, FrameworkError>),
}

impl<T: ActorEntity> Expectation<T> {
    fn name(&self) -> &'static str {
        match self {
            Expectation::Create(_) => "create",
            Expectation::Get(_) => "get",
            Expectation::GetMany(_) => "get_many",
            Expectation::Query(_) => "query",
            Expectation::Update(_) => "update",
            Expectation::Action(_) => "action",
        }
    }
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock store with expectation tracking.
///
/// # Example
/// ```ignore
/// let mock = MockClient::<Order>::new();
/// mock.expect_get().return_ok(Some(order));
/// mock.expect_action().return_err(FrameworkError::ActorClosed);
///
/// let client = OrderClient::new(mock.client());
/// // exercise code that uses the client...
/// mock.verify();
/// ```
///
/// A request that arrives with no matching expectation is recorded and its
/// caller gets `ActorDropped`; [`MockClient::verify`] then panics so the test
/// fails loudly instead of hanging.
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Expectations<T>,
    unexpected: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let unexpected = Arc::new(Mutex::new(Vec::new()));
        let expectations_clone = expectations.clone();
        let unexpected_clone = unexpected.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = expectations_clone
                    .lock()
                    .ok()
                    .and_then(|mut exps| exps.pop_front());

                match (request, expectation) {
                    (ResourceRequest::Create { respond_to, .. }, Some(Expectation::Create(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (ResourceRequest::Get { respond_to, .. }, Some(Expectation::Get(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (ResourceRequest::GetMany { respond_to, .. }, Some(Expectation::GetMany(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (ResourceRequest::Query { respond_to, .. }, Some(Expectation::Query(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (ResourceRequest::Update { respond_to, .. }, Some(Expectation::Update(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (ResourceRequest::Action { respond_to, .. }, Some(Expectation::Action(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (request, expectation) => {
                        let got = format!("{:?}", RequestKind::of(&request));
                        let wanted = expectation.as_ref().map(|e| e.name()).unwrap_or("nothing");
                        if let Ok(mut log) = unexpected_clone.lock() {
                            log.push(format!("got {got}, expected {wanted}"));
                        }
                        // Dropping the request drops its responder: the caller sees ActorDropped.
                    }
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            unexpected,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    pub fn expect_create(&self) -> ExpectationBuilder<T, T> {
        self.builder(Expectation::Create)
    }

    pub fn expect_get(&self) -> ExpectationBuilder<T, Option<T>> {
        self.builder(Expectation::Get)
    }

    pub fn expect_get_many(&self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(Expectation::GetMany)
    }

    pub fn expect_query(&self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(Expectation::Query)
    }

    pub fn expect_update(&self) -> ExpectationBuilder<T, T> {
        self.builder(Expectation::Update)
    }

    pub fn expect_action(&self) -> ExpectationBuilder<T, T::ActionResult> {
        self.builder(Expectation::Action)
    }

    fn builder<R>(
        &self,
        wrap: fn(Result<R, FrameworkError>) -> Expectation<T>,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            wrap,
            expectations: self.expectations.clone(),
        }
    }

    /// Panics unless every expectation was consumed and nothing unexpected arrived.
    pub fn verify(&self) {
        let unexpected = self.unexpected.lock().map(|u| u.clone()).unwrap_or_default();
        if !unexpected.is_empty() {
            panic!("Unexpected requests: {}", unexpected.join("; "));
        }
        let remaining = self.expectations.lock().map(|e| e.len()).unwrap_or_default();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
enum RequestKind {
    Create,
    Get,
    GetMany,
    Query,
    Update,
    Action,
}

impl RequestKind {
    fn of<T: ActorEntity>(request: &ResourceRequest<T>) -> Self {
        match request {
            ResourceRequest::Create { .. } => RequestKind::Create,
            ResourceRequest::Get { .. } => RequestKind::Get,
            ResourceRequest::GetMany { .. } => RequestKind::GetMany,
            ResourceRequest::Query { .. } => RequestKind::Query,
            ResourceRequest::Update { .. } => RequestKind::Update,
            ResourceRequest::Action { .. } => RequestKind::Action,
        }
    }
}

/// Builder returned by the `expect_*` methods.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    wrap: fn(Result<R, FrameworkError>) -> Expectation<T>,
    expectations: Expectations<T>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    /// Reply with `value`.
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    /// Reply with `error`.
    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, FrameworkError>) {
        if let Ok(mut exps) = self.expectations.lock() {
            exps.push_back((self.wrap)(response));
        }
    }
}
