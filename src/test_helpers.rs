//! Hand-written mocks for the HTTP and model seams, shared by unit and
//! integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::http::{HttpResponse, HttpTransport, TransportError};
use crate::model::{LanguageModel, ModelError};
use crate::providers::FileChange;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

type Scripted = Result<HttpResponse, String>;

/// Replays scripted responses in order and records every request.
/// Clones share the same script and log.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            requests: Arc::default(),
        }
    }

    pub fn ok(body: &str) -> Scripted {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Scripted {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(
        &self,
        method: &'static str,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: body.cloned(),
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(scripted) => scripted.map_err(TransportError),
            None => Err(TransportError("no more mock responses".to_string())),
        }
    }
}

impl HttpTransport for MockTransport {
    fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        self.record("GET", url, headers, None)
    }

    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        self.record("POST", url, headers, Some(body))
    }
}

/// Language model that replays canned completions and counts calls.
#[derive(Clone, Default)]
pub struct MockModel {
    replies: Arc<Mutex<VecDeque<Result<String, ModelError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockModel {
    pub fn new(replies: Vec<Result<String, ModelError>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Default::default()
        }
    }

    /// A model that answers every call with the same text.
    pub fn always(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string()); 32])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl LanguageModel for MockModel {
    fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::EmptyResponse))
    }
}

/// Create a `FileChange` with a modified status.
pub fn make_change(filename: &str, diff: Option<&str>) -> FileChange {
    FileChange {
        filename: filename.to_string(),
        status: Some("modified".to_string()),
        diff: diff.map(str::to_string),
    }
}
