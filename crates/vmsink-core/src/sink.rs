//! Ingestion sinks: where import and forward requests are sent.

use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default timeout for a single ingestion request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors from ingestion sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("endpoint returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<SinkError> for vmsink_common::Error {
    fn from(err: SinkError) -> Self {
        vmsink_common::Error::Sink(err.to_string())
    }
}

/// One POST to the metrics database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestRequest {
    /// Path below the host, e.g. `/api/v1/import/csv`.
    pub path: String,
    /// Query parameters, unencoded.
    pub query: Vec<(String, String)>,
    pub body: String,
}

impl IngestRequest {
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Human-readable URL for logs (query left unencoded).
    pub fn display_url(&self, host: &str) -> String {
        let mut url = format!("{}{}", host, self.path);
        for (i, (k, v)) in self.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(k);
            url.push('=');
            url.push_str(v);
        }
        url
    }
}

/// Destination for ingestion requests.
pub trait IngestSink {
    fn submit(&self, request: &IngestRequest) -> Result<(), SinkError>;
}

impl<S: IngestSink + ?Sized> IngestSink for &S {
    fn submit(&self, request: &IngestRequest) -> Result<(), SinkError> {
        (**self).submit(request)
    }
}

/// Blocking HTTP sink.
pub struct HttpSink {
    host: String,
    agent: ureq::Agent,
}

impl HttpSink {
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_timeout(host, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(host: impl Into<String>, timeout: Duration) -> Self {
        let host: String = host.into();
        Self {
            host: host.trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl IngestSink for HttpSink {
    fn submit(&self, request: &IngestRequest) -> Result<(), SinkError> {
        let url = format!("{}{}", self.host, request.path);
        debug!(url = %request.display_url(&self.host), bytes = request.body.len(), "POST");
        let mut call = self
            .agent
            .post(&url)
            .set("Content-Type", "text/plain; charset=utf-8");
        for (key, value) in &request.query {
            call = call.query(key, value);
        }
        match call.send_string(&request.body) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, response)) => Err(SinkError::Status {
                code,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(transport)) => {
                Err(SinkError::Transport(transport.to_string()))
            }
        }
    }
}

/// Keeps submitted requests in memory, optionally failing every call.
#[derive(Debug, Default)]
pub struct RecordingSink {
    requests: Mutex<Vec<IngestRequest>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that records each request and then reports a transport error.
    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn requests(&self) -> Vec<IngestRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl IngestSink for RecordingSink {
    fn submit(&self, request: &IngestRequest) -> Result<(), SinkError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        if self.fail {
            return Err(SinkError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}
