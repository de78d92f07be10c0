//! Terminal chat with the Headstarter support agent.
//!
//! This binary opens one Gemini chat session and lets the user talk to the
//! support agent, either in a full-screen view or, with `--plain`, in a
//! line-oriented REPL.
//!
//! # Usage
//!
//! ```bash
//! # Full-screen view with default settings
//! GEMINI_API_KEY=... supportchat
//!
//! # Dark theme, logs written to a file
//! supportchat --theme dark --log-file supportchat.log
//!
//! # Line-oriented mode without colors (useful for piping output)
//! supportchat --plain --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/theme [light|dark]` - Switch the color theme
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::sync::{Arc, Mutex};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use time::{OffsetDateTime, UtcOffset};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use supportchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, LineInput, PlainPrinter, Submission,
    TranscriptRenderer, classify_line, help_text, run_tui, start_session,
};
use supportchat::{ChatProvider, Gemini, TracingClientLogger, Unavailable};

/// Main entry point for the supportchat application.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("supportchat [OPTIONS]");
    let mut config = match ChatConfig::try_from(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("supportchat: {err}");
            std::process::exit(2);
        }
    };
    if !config.plain && !io::stdout().is_terminal() {
        config.plain = true;
    }

    // The local offset can only be read while the process is single-threaded.
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let renderer = TranscriptRenderer::new(offset);

    init_logging(&config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let provider = provider(&config);
        if config.plain {
            run_plain(&config, provider, renderer).await
        } else {
            let controller = ChatController::with_greeting(config.greeting.clone());
            let controller = run_tui(controller, provider, &config, renderer).await?;
            let stats = controller.stats();
            tracing::info!(
                messages = controller.transcript().len(),
                answered = stats.answered,
                failed = stats.failed,
                "chat closed"
            );
            println!("Goodbye!");
            Ok(())
        }
    })
}

/// Installs the tracing subscriber.
///
/// The full-screen view owns the terminal, so without `--log-file` it logs
/// nowhere.  Plain mode logs warnings to stderr unless `RUST_LOG` says
/// otherwise.
fn init_logging(config: &ChatConfig) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if config.log_file.is_some() { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .with(filter)
                .init();
        }
        None if config.plain => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(io::stderr),
                )
                .with(filter)
                .init();
        }
        None => {}
    }
    Ok(())
}

/// Builds the Gemini provider.  A client that cannot be configured still
/// yields a provider, one whose session start fails with the reason.
fn provider(config: &ChatConfig) -> Arc<dyn ChatProvider> {
    match Gemini::with_options(None, config.api_base.clone(), config.request_timeout) {
        Ok(client) => Arc::new(client.with_logger(Arc::new(TracingClientLogger))),
        Err(err) => {
            tracing::error!(error = %err, "cannot configure Gemini client");
            Arc::new(Unavailable::new(err))
        }
    }
}

/// Line-oriented REPL.
async fn run_plain(
    config: &ChatConfig,
    provider: Arc<dyn ChatProvider>,
    renderer: TranscriptRenderer,
) -> Result<(), Box<dyn std::error::Error>> {
    let width = crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .unwrap_or(80);
    let mut printer = PlainPrinter::new(renderer, width, config.use_color);
    printer.set_theme(config.theme);
    let mut controller = ChatController::with_greeting(config.greeting.clone());

    // Ctrl+C outside the prompt cancels whatever is in flight.
    let root = CancellationToken::new();
    let in_flight = Arc::new(Mutex::new(root.child_token()));
    let handler_token = Arc::clone(&in_flight);
    ctrlc::set_handler(move || {
        cancel_in_flight(&handler_token);
    })?;

    printer.print_loading()?;
    let cancel = next_token(&in_flight, &root);
    let result = start_session(
        provider.as_ref(),
        config.start_params(),
        config.request_timeout,
        cancel,
    )
    .await;
    controller.on_session_started(result, OffsetDateTime::now_utc());
    printer.print_new_messages(controller.transcript())?;
    if let Some(err) = controller.last_error() {
        printer.print_error(&err.to_string())?;
    }
    printer.print_info("Type /help for commands, /quit to exit")?;

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let text = match classify_line(&line) {
                    LineInput::Blank => continue,
                    LineInput::Command(cmd) => {
                        let _ = rl.add_history_entry(line.trim());
                        match cmd {
                            ChatCommand::Quit => {
                                println!("Goodbye!");
                                break;
                            }
                            ChatCommand::Help => printer.print_info(help_text())?,
                            ChatCommand::Theme(theme) => {
                                let theme = theme.unwrap_or_else(|| printer.theme().toggled());
                                printer.set_theme(theme);
                                printer.print_info(&format!("Theme set to {theme}."))?;
                            }
                            ChatCommand::Stats => print_stats(&mut printer, &controller)?,
                            ChatCommand::Invalid(message) => printer.print_error(&message)?,
                        }
                        continue;
                    }
                    LineInput::Message(text) => text.to_string(),
                };
                let _ = rl.add_history_entry(text.as_str());

                match controller.submit_text(text, OffsetDateTime::now_utc()) {
                    Submission::Dispatched(exchange) => {
                        printer.print_new_messages(controller.transcript())?;
                        printer.print_loading()?;
                        let cancel = next_token(&in_flight, &root);
                        let outcome = exchange.run(config.request_timeout, cancel).await;
                        controller.on_exchange_settled(outcome, OffsetDateTime::now_utc());
                        printer.print_new_messages(controller.transcript())?;
                        if let Some(err) = controller.last_error() {
                            printer.print_error(&err.to_string())?;
                        }
                    }
                    Submission::NoSession => {
                        printer.print_new_messages(controller.transcript())?;
                        if let Some(err) = controller.last_error() {
                            printer.print_error(&err.to_string())?;
                        }
                    }
                    Submission::Busy => {
                        printer.print_info("Still waiting for the previous reply.")?;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                printer.print_error(&format!("Input error: {}", err))?;
                break;
            }
        }
    }

    root.cancel();
    Ok(())
}

fn cancel_in_flight(in_flight: &Mutex<CancellationToken>) {
    let token = in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    token.cancel();
}

/// Replaces the in-flight token with a fresh child of `root` and returns it.
fn next_token(in_flight: &Mutex<CancellationToken>, root: &CancellationToken) -> CancellationToken {
    let mut token = in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *token = root.child_token();
    token.clone()
}

fn print_stats(
    printer: &mut PlainPrinter,
    controller: &ChatController,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = controller.stats();
    let mut lines = vec![
        "Session Statistics:".to_string(),
        format!("  Status: {:?}", controller.session_status()),
        format!("  Messages: {}", controller.transcript().len()),
        format!("  Sent: {}", stats.dispatched),
        format!("  Answered: {}", stats.answered),
        format!("  Failed: {}", stats.failed),
        format!("  Unanswered (no session): {}", stats.unanswered),
    ];
    if let Some(turns) = controller.session_history_len() {
        lines.push(format!("  Session turns: {turns}"));
    }
    if let Some(err) = controller.last_error() {
        lines.push(format!("  Last error: {}", err.cause()));
    }
    printer.print_info(&lines.join("\n"))?;
    Ok(())
}
