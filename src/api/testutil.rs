//! Test utilities for client unit tests.

use std::{collections::VecDeque, sync::Mutex};

use serde_json::Value;

use crate::{AirtableClient, Error, Profile, Transport};

/// A request as seen by [MockTransport].
#[derive(Debug, Clone)]
pub(crate) struct SentRequest {
    pub method: http::Method,
    pub uri: String,
    pub body: Option<Value>,
}

/// A transport that records requests and replays scripted responses, in
/// order. Panics if a request arrives with no response left to give.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<(u16, String)>>,
    sent: Mutex<Vec<SentRequest>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a response with a JSON body.
    pub(crate) fn respond(self, status: u16, body: Value) -> Self {
        self.respond_raw(status, &body.to_string())
    }

    /// Queue a response with an arbitrary body.
    pub(crate) fn respond_raw(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back((status, body.to_owned()));
        self
    }

    /// Everything sent so far.
    pub(crate) fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn send(&self, req: http::Request<String>) -> Result<http::Response<Vec<u8>>, Error> {
        let (parts, body) = req.into_parts();
        let body = (!body.is_empty()).then(|| serde_json::from_str(&body).unwrap());
        self.sent.lock().unwrap().push(SentRequest {
            method: parts.method,
            uri: parts.uri.to_string(),
            body,
        });

        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected request: no response left");

        Ok(http::Response::builder()
            .status(status)
            .body(body.into_bytes())
            .unwrap())
    }
}

/// A client for base `appTest` on top of the given transport.
pub(crate) fn test_client(transport: MockTransport) -> AirtableClient<MockTransport> {
    AirtableClient::with_transport(Profile::new("patTest", "appTest"), transport)
}

/// A list response with one record per ID.
pub(crate) fn page(ids: &[&str], offset: Option<&str>) -> Value {
    let records = ids
        .iter()
        .map(|id| serde_json::json!({"id": id, "fields": {"Name": id}}))
        .collect::<Vec<_>>();

    match offset {
        Some(offset) => serde_json::json!({"records": records, "offset": offset}),
        None => serde_json::json!({"records": records}),
    }
}
