//! Registration
//!
//! Client side of the signup form: the five form fields, the call to the
//! registration service, and how its reply decides what the user sees.
//!
//! | Reply                             | Alert                                 | Next screen |
//! |-----------------------------------|---------------------------------------|-------------|
//! | status 409                        | `Email is already registered.`        | chat        |
//! | body with a truthy `response`     | `User registered successfully`        | chat        |
//! | anything else                     | `Registration failed: <message>`      | form        |
//! | transport or parse failure        | `Error: Unable to register.`          | form        |
//!
//! The failure message is the server's `message` (or FastAPI's `detail`)
//! when present and `Unknown error` otherwise.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::backend::{is_truthy, ServiceEndpoint};

/// Alert shown when the email already has an account
pub const ALREADY_REGISTERED_TEXT: &str = "Email is already registered.";

/// Alert shown after a successful registration
pub const REGISTERED_TEXT: &str = "User registered successfully";

/// Alert shown when the service could not be reached or understood
pub const REGISTER_ERROR_TEXT: &str = "Error: Unable to register.";

/// Errors from a registration call
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection refused, reset, timed out, ...
    #[error("registration request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The reply body was not JSON
    #[error("malformed registration body: {0}")]
    Malformed(String),

    /// Any other failure reported by a service implementation
    #[error("registration service failed: {0}")]
    Service(String),
}

/// Signup form fields, serialized with the service's key names
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// First name
    #[serde(rename = "First_Name")]
    pub first_name: String,
    /// Last name
    #[serde(rename = "Last_Name")]
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Password again
    pub confirm_password: String,
}

impl Registration {
    /// Whether every field has non-whitespace content
    ///
    /// Submitting an incomplete form is a no-op. Anything stricter is left
    /// to the service.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.password,
            &self.confirm_password,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// What the registration service decided
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// New account created
    Registered,
    /// The email already has an account (status 409)
    AlreadyRegistered,
    /// The service refused, with its message if it gave one
    Rejected {
        /// Server-provided reason
        message: Option<String>,
    },
}

impl RegistrationOutcome {
    /// Classify a reply by status code and decoded body
    #[must_use]
    pub fn from_reply(status: u16, body: &serde_json::Value) -> Self {
        if status == 409 {
            return Self::AlreadyRegistered;
        }

        if body.get("response").is_some_and(is_truthy) {
            return Self::Registered;
        }

        let message = ["message", "detail"]
            .iter()
            .filter_map(|key| body.get(*key))
            .find(|value| is_truthy(value))
            .map(|value| match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            });

        Self::Rejected { message }
    }

    /// Text for the blocking alert
    #[must_use]
    pub fn alert_text(&self) -> String {
        match self {
            Self::Registered => REGISTERED_TEXT.to_string(),
            Self::AlreadyRegistered => ALREADY_REGISTERED_TEXT.to_string(),
            Self::Rejected { message } => format!(
                "Registration failed: {}",
                message.as_deref().unwrap_or("Unknown error")
            ),
        }
    }

    /// Whether the user moves on to the chat screen
    #[must_use]
    pub fn proceeds_to_chat(&self) -> bool {
        matches!(self, Self::Registered | Self::AlreadyRegistered)
    }
}

/// Registration service trait
#[async_trait]
pub trait RegistrationService: Send + Sync {
    /// Submit the form and classify the reply
    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<RegistrationOutcome, RegistrationError>;
}

/// Registration service reached over HTTP (`POST /register/`)
#[derive(Clone, Debug)]
pub struct HttpRegistrationService {
    endpoint: ServiceEndpoint,
    http_client: reqwest::Client,
}

impl HttpRegistrationService {
    /// Create a client for the given endpoint
    pub fn new(endpoint: ServiceEndpoint) -> Result<Self, RegistrationError> {
        let http_client = endpoint.http_client().map_err(RegistrationError::Client)?;
        Ok(Self {
            endpoint,
            http_client,
        })
    }

    fn register_url(&self) -> String {
        format!("{}/register/", self.endpoint.base_url())
    }
}

#[async_trait]
impl RegistrationService for HttpRegistrationService {
    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let response = self
            .http_client
            .post(self.register_url())
            .json(registration)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let data: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| RegistrationError::Malformed(e.to_string()))?;

        let outcome = RegistrationOutcome::from_reply(status, &data);
        tracing::info!(status, outcome = ?outcome, "Registration reply");
        Ok(outcome)
    }
}

/// Alert text for a finished registration attempt
///
/// Failures are logged and collapse into [`REGISTER_ERROR_TEXT`].
#[must_use]
pub fn alert_for(result: &Result<RegistrationOutcome, RegistrationError>) -> String {
    match result {
        Ok(outcome) => outcome.alert_text(),
        Err(e) => {
            tracing::warn!(error = %e, "Registration request failed");
            REGISTER_ERROR_TEXT.to_string()
        }
    }
}
