//! Scripted transport for tests.
//!
//! Not part of the stable API; enabled for downstream tests via the
//! `test-util` feature.

use crate::transport::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use gantry_types::TransportError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A transport that replays a scripted sequence of outcomes and records every
/// request it is handed.
#[derive(Debug, Default)]
pub struct FakeTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    /// Creates an empty fake; outcomes are queued with the `push_*` methods.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Creates a fake that responds with the given status codes in order,
    /// each with an empty body.
    #[must_use]
    pub fn with_statuses(statuses: &[u16]) -> Arc<Self> {
        let fake = Self::new();
        for &status in statuses {
            fake.push_status(status);
        }
        fake
    }

    /// Queues a response with the given status code and an empty body.
    pub fn push_status(&self, status: u16) {
        self.push_response(HttpResponse::new(status, ""));
    }

    /// Queues a 200 response with the given JSON body.
    pub fn push_json(&self, body: serde_json::Value) {
        self.push_response(HttpResponse::new(200, body.to_string()));
    }

    /// Queues a 200 response with the given text body.
    pub fn push_text(&self, body: &str) {
        self.push_response(HttpResponse::new(200, body.to_string()));
    }

    /// Queues an arbitrary response.
    pub fn push_response(&self, response: HttpResponse) {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Ok(response));
    }

    /// Queues a transport-level failure.
    pub fn push_error(&self, error: TransportError) {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Err(error));
    }

    /// All requests seen so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Number of requests seen so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }

    /// The `n`-th request seen (zero-based).
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n + 1` requests were made.
    #[must_use]
    pub fn request(&self, n: usize) -> HttpRequest {
        self.requests.lock().expect("requests lock")[n].clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().expect("requests lock").push(request);
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| panic!("FakeTransport script exhausted"))
    }
}
