//! Command Line
//!
//! ```bash
//! # Interactive client, starting on the signup form
//! nutri-chat
//!
//! # Straight to the chat screen, custom answer service
//! nutri-chat --skip-signup --answer-host 10.0.0.5 --answer-port 9009
//!
//! # One question, printed as plain text
//! nutri-chat ask "How much protein after a workout?"
//!
//! # Is the answer service up?
//! nutri-chat status
//!
//! # Verbose logging
//! RUST_LOG=debug nutri-chat ask "hi"
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use nutri_chat_core::ConfigOverrides;

/// nutri-chat - Terminal client for the nutrition planner assistant
#[derive(Parser, Debug)]
#[command(name = "nutri-chat")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "NUTRI_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Answer service host
    #[arg(long, value_name = "HOST")]
    pub answer_host: Option<String>,

    /// Answer service port
    #[arg(long, value_name = "PORT")]
    pub answer_port: Option<u16>,

    /// Registration service host
    #[arg(long, value_name = "HOST")]
    pub register_host: Option<String>,

    /// Registration service port
    #[arg(long, value_name = "PORT")]
    pub register_port: Option<u16>,

    /// Start on the chat screen
    #[arg(long)]
    pub skip_signup: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "NUTRI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Run headless instead of opening the terminal UI
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Headless subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Ask one question and print the conversation
    Ask {
        /// Question text, sent as typed
        text: String,
    },
    /// Check whether the answer service is online
    Status,
}

impl Args {
    /// CLI values that take priority over env and config file
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            answer_host: self.answer_host.clone(),
            answer_port: self.answer_port,
            register_host: self.register_host.clone(),
            register_port: self.register_port,
            skip_signup: self.skip_signup.then_some(true),
        }
    }
}
