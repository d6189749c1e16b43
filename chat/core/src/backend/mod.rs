//! Answer Service Integration
//!
//! This module provides access to the service that answers chat submissions
//! through a common trait interface.
//!
//! # Usage
//!
//! ```ignore
//! use nutri_chat_core::backend::{AnswerRequest, AnswerService, HttpAnswerService, ServiceEndpoint};
//!
//! let service = HttpAnswerService::new(ServiceEndpoint::answer_default())?;
//! let reply = service.answer(&AnswerRequest::new("How much protein?")).await?;
//! ```

mod http;
mod traits;

pub use http::HttpAnswerService;
pub(crate) use traits::is_truthy;
pub use traits::{AnswerError, AnswerReply, AnswerRequest, AnswerService, ServiceEndpoint};
