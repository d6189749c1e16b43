//! nutri-chat Entry Point
//!
//! Launches the terminal client for the nutrition planner assistant, or runs
//! one of the headless subcommands.
//!
//! Usage:
//!   nutri-chat [OPTIONS] [COMMAND]
//!
//! Commands:
//!   ask <TEXT>  Ask one question and print the conversation
//!   status      Check whether the answer service is online

use std::fs;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use nutri_chat_core::{
    load_config, load_config_from_path, AnswerService, ChatController, ClientConfig,
    HttpAnswerService, SubmitOutcome,
};
use nutri_chat_tui::cli::{Args, Command};
use nutri_chat_tui::display::transcript;
use nutri_chat_tui::App;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let interactive = args.command.is_none();

    init_logging(&args.log_level, interactive)?;

    let mut config = match &args.config {
        Some(path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line options")?;
    tracing::info!(
        source = %config.source(),
        answer = %config.answer.base_url(),
        registration = %config.registration.base_url(),
        "Configuration loaded"
    );

    match args.command {
        Some(Command::Ask { text }) => ask(&config, &text).await,
        Some(Command::Status) => status(&config).await,
        None => run_tui(&config).await,
    }
}

/// Log filter from `RUST_LOG`, falling back to `level` for our crates
fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("nutri_chat_tui={level},nutri_chat_core={level}"))
    })
}

/// Initialize logging
///
/// The TUI owns stdout, so interactive runs log to a file under the state
/// directory. Headless commands log to stderr.
fn init_logging(level: &str, interactive: bool) -> Result<()> {
    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(log_filter(level))
            .with_target(false)
            .with_writer(io::stderr)
            .init();
        return Ok(());
    }

    let dir = log_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    let path = dir.join("nutri-chat.log");
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("nutri-chat")
}

/// `ask`: one submission through the controller, printed as plain text
async fn ask(config: &ClientConfig, text: &str) -> Result<()> {
    let service = HttpAnswerService::new(config.answer.clone())
        .context("Failed to create answer service client")?;
    let mut controller = ChatController::detached(service);

    if controller.submit_and_wait(text).await == SubmitOutcome::Ignored {
        anyhow::bail!("Nothing to ask: the question is blank");
    }

    print!("{}", transcript(&controller.render()));
    Ok(())
}

/// `status`: report what the answer service says about itself
async fn status(config: &ClientConfig) -> Result<()> {
    let service = HttpAnswerService::new(config.answer.clone())
        .context("Failed to create answer service client")?;
    let message = service
        .system_status()
        .await
        .with_context(|| {
            format!(
                "Answer service at {} is unreachable",
                service.endpoint().base_url()
            )
        })?;

    println!("{}: {message}", service.endpoint().base_url());
    Ok(())
}

async fn run_tui(config: &ClientConfig) -> Result<()> {
    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: nutri-chat requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  • Running in a non-interactive environment (CI, container)");
        eprintln!("  • SSH without -t flag");
        eprintln!("  • Piped stdin/stdout");
        eprintln!();
        eprintln!("For scripted use, try:");
        eprintln!("  nutri-chat ask \"What should I eat before a run?\"");
        eprintln!("  nutri-chat status");
        std::process::exit(1);
    }

    let mut app = App::from_config(config)?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
