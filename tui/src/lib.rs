//! nutri-chat TUI - Terminal interface for the nutrition planner assistant
//!
//! This crate provides the full-screen terminal surface over
//! `nutri-chat-core`, plus the headless `ask` and `status` commands.
//!
//! # Architecture
//!
//! - **App**: event loop, screen switching, per-frame polling of the controller
//! - **Signup**: registration form state and alert handling
//! - **Display**: controller events to wrapped, styled lines
//! - **Widgets**: bottom-anchored scrollable text block

pub mod app;
pub mod cli;
pub mod display;
pub mod signup;
pub mod theme;
pub mod widgets;

pub use app::{App, Screen};
