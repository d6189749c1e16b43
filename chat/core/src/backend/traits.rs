//! Answer Service Traits
//!
//! Trait definitions for the service that answers chat submissions. The
//! controller only ever sees this trait, so tests and alternative transports
//! plug in without touching the conversation logic.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from an answer service call
///
/// The controller collapses every variant into the same fallback turn; the
/// distinction only matters for logs.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection refused, reset, timed out, ...
    #[error("answer service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not JSON, or the answer field had the wrong type
    #[error("malformed answer body: {0}")]
    Malformed(String),

    /// Any other failure reported by a service implementation
    #[error("answer service failed: {0}")]
    Service(String),
}

/// Body sent to the answer service
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnswerRequest {
    /// The participant's text, untrimmed
    pub input_text: String,
}

impl AnswerRequest {
    /// Create a request for the given query
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
        }
    }
}

/// Structurally valid reply from the answer service
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AnswerReply {
    /// The answer field; absent or null when nothing was generated
    #[serde(default)]
    pub response: Option<String>,
}

impl AnswerReply {
    /// Reply carrying an answer
    pub fn with_answer(answer: impl Into<String>) -> Self {
        Self {
            response: Some(answer.into()),
        }
    }

    /// Reply without an answer field
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The answer, if present and non-empty
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.response.as_deref().filter(|a| !a.is_empty())
    }

    /// Extract a reply from a decoded JSON body
    ///
    /// The body must be an object. A falsy answer field (missing, null,
    /// `false`, `0`, `""`) is an empty reply; a truthy one must be a string.
    pub fn from_json(body: &serde_json::Value) -> Result<Self, AnswerError> {
        let Some(object) = body.as_object() else {
            return Err(AnswerError::Malformed(format!(
                "expected a JSON object, got {body}"
            )));
        };

        match object.get("response") {
            Some(serde_json::Value::String(answer)) => Ok(Self::with_answer(answer.clone())),
            Some(other) if is_truthy(other) => Err(AnswerError::Malformed(format!(
                "expected a string answer, got {other}"
            ))),
            _ => Ok(Self::empty()),
        }
    }
}

/// JavaScript-style truthiness, which is what the services' web clients test
pub(crate) fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// Where a remote service lives
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Host name or address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Per-request timeout; `None` waits until the call settles
    pub timeout: Option<Duration>,
}

impl ServiceEndpoint {
    /// Create an endpoint without a timeout
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: None,
        }
    }

    /// Sample deployment address of the answer service
    #[must_use]
    pub fn answer_default() -> Self {
        Self::new("127.0.0.1", 8009)
    }

    /// Sample deployment address of the registration service
    #[must_use]
    pub fn registration_default() -> Self {
        Self::new("127.0.0.1", 8056)
    }

    /// Set a per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Base URL, e.g. `http://127.0.0.1:8009`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Build a reqwest client honouring the timeout
    pub(crate) fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

/// Answer service trait
///
/// Implement this trait to answer chat submissions from somewhere other than
/// the HTTP service.
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Service name for logs
    fn name(&self) -> &str;

    /// Send one query and wait for the reply
    ///
    /// Called exactly once per accepted submission. Implementations must not
    /// retry.
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerReply, AnswerError>;

    /// Human-readable service status
    async fn system_status(&self) -> Result<String, AnswerError>;

    /// Check if the service is reachable
    async fn health_check(&self) -> bool {
        self.system_status().await.is_ok()
    }
}
