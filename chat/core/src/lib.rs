//! nutri-chat Core - Headless Chat Session for the Nutrition Assistant
//!
//! This crate holds the conversation logic of nutri-chat, independent of any
//! UI framework. The terminal surface drives it interactively; the `ask`
//! subcommand and the tests drive it headless.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      UI Surfaces                          │
//! │   ┌──────────────────┐          ┌──────────────────────┐  │
//! │   │  TUI (ratatui)   │          │   Headless (`ask`)   │  │
//! │   └────────┬─────────┘          └──────────┬───────────┘  │
//! │            └──────────────┬────────────────┘              │
//! │                  ChatEvent (up), submit (down)             │
//! └───────────────────────────┼───────────────────────────────┘
//!                             │
//! ┌───────────────────────────┼───────────────────────────────┐
//! │                       CHAT CORE                            │
//! │  ┌────────────────────────┴─────────────────────────────┐  │
//! │  │                  ChatController                       │  │
//! │  │  ┌──────────────┐  ┌──────────┐  ┌────────────────┐  │  │
//! │  │  │ Conversation │  │ Composer │  │ AnswerService  │  │  │
//! │  │  │     Log      │  │          │  │    (HTTP)      │  │  │
//! │  │  └──────────────┘  └──────────┘  └────────────────┘  │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! │   render (Markdown → styled lines)   registration (HTTP)   │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use nutri_chat_core::{ChatController, HttpAnswerService, ServiceEndpoint};
//! use tokio::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::channel(32);
//! let service = HttpAnswerService::new(ServiceEndpoint::answer_default())?;
//! let mut controller = ChatController::new(service, tx);
//!
//! controller.submit("What should I eat after a run?").await;
//!
//! loop {
//!     while let Ok(event) = rx.try_recv() {
//!         // Update the UI
//!     }
//!     controller.poll_answer().await;
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Answer service abstraction and its HTTP client
//! - [`config`]: TOML/env/CLI configuration
//! - [`controller`]: The chat session state machine
//! - [`messages`]: Events and states reported to surfaces
//! - [`registration`]: Signup form and registration service client
//! - [`render`]: Markdown rendering into styled lines
//! - [`session`]: Conversation log and composer
//!
//! # No TUI Dependencies
//!
//! This crate has no dependency on ratatui, crossterm, or any other UI
//! framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod messages;
pub mod registration;
pub mod render;
pub mod session;

// Re-exports for convenience
pub use backend::{
    AnswerError, AnswerReply, AnswerRequest, AnswerService, HttpAnswerService, ServiceEndpoint,
};
pub use controller::{ChatController, SubmitOutcome, FETCH_ERROR_TEXT, NO_RESPONSE_TEXT};
pub use messages::{AnswerKind, ChatEvent, ControllerState, Origin};
pub use registration::{
    HttpRegistrationService, Registration, RegistrationError, RegistrationOutcome,
    RegistrationService,
};
pub use render::{
    render_log, render_markdown, render_plain, RenderedLine, RenderedTurn, SpanKind, SpanStyle,
    StyledSpan,
};
pub use session::{Composer, ConversationLog, Turn};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ClientConfig, ClientToml,
    ConfigError, ConfigOverrides, ConfigSource,
};
