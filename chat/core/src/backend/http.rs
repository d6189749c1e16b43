//! HTTP Answer Service
//!
//! Client for the nutrition assistant's HTTP API.
//!
//! # API
//!
//! - `POST /generateanswer` - body `{"input_text": ...}`, reply `{"response": ...}`
//! - `GET /system-status` - reply `{"response": "System is online"}`
//!
//! The reply status code is not inspected. The service reports its own
//! failures as JSON bodies without an answer field, which the controller
//! treats as an empty result.

use async_trait::async_trait;

use super::traits::{AnswerError, AnswerReply, AnswerRequest, AnswerService, ServiceEndpoint};

/// Answer service reached over HTTP
#[derive(Clone, Debug)]
pub struct HttpAnswerService {
    endpoint: ServiceEndpoint,
    http_client: reqwest::Client,
}

impl HttpAnswerService {
    /// Create a client for the given endpoint
    pub fn new(endpoint: ServiceEndpoint) -> Result<Self, AnswerError> {
        let http_client = endpoint.http_client().map_err(AnswerError::Client)?;
        Ok(Self {
            endpoint,
            http_client,
        })
    }

    /// The endpoint this client talks to
    #[must_use]
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    fn generate_url(&self) -> String {
        format!("{}/generateanswer", self.endpoint.base_url())
    }

    fn status_url(&self) -> String {
        format!("{}/system-status", self.endpoint.base_url())
    }

    async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, AnswerError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(%status, "Answer service replied with an error status");
        }
        serde_json::from_str(&body).map_err(|e| AnswerError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl AnswerService for HttpAnswerService {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerReply, AnswerError> {
        let url = self.generate_url();
        tracing::debug!(url = %url, bytes = request.input_text.len(), "Sending query");

        let response = self.http_client.post(&url).json(request).send().await?;
        let data = Self::read_json(response).await?;

        AnswerReply::from_json(&data)
    }

    async fn system_status(&self) -> Result<String, AnswerError> {
        let response = self.http_client.get(self.status_url()).send().await?;
        let status = response.status();
        let data = Self::read_json(response).await?;

        if !status.is_success() {
            return Err(AnswerError::Service(format!("status endpoint returned {status}")));
        }

        AnswerReply::from_json(&data)?
            .response
            .ok_or_else(|| AnswerError::Malformed("status reply has no response field".into()))
    }
}
