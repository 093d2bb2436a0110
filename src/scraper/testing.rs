use std::cell::RefCell;

use serde_json::Value;

use super::transport::{FetchResponse, Transport};

/// One recorded outbound call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// In-memory transport. Routes match by URL prefix, first route wins; an
/// unrouted URL behaves like a refused connection.
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<(String, FetchResponse)>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, prefix: &str, body: impl Into<String>) -> Self {
        self.respond(
            prefix,
            FetchResponse {
                succeeded: true,
                body: Some(body.into()),
                status: 200,
                error: None,
            },
        )
    }

    pub fn route_json(self, prefix: &str, payload: &Value) -> Self {
        self.route(prefix, payload.to_string())
    }

    pub fn route_status(self, prefix: &str, status: u16) -> Self {
        self.respond(
            prefix,
            FetchResponse {
                succeeded: false,
                body: Some(String::new()),
                status,
                error: None,
            },
        )
    }

    pub fn respond(mut self, prefix: &str, response: FetchResponse) -> Self {
        self.routes.push((prefix.to_string(), response));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.url.clone()).collect()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.url.starts_with(prefix))
            .count()
    }
}

impl Transport for MockTransport {
    async fn fetch(&self, url: &str, headers: &[(&str, &str)]) -> FetchResponse {
        self.calls.borrow_mut().push(RecordedCall {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        self.routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| FetchResponse::error("connection refused"))
    }
}
