//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the view instead of being sent to the
//! support agent.

use crate::chat::theme::Theme;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Switch to the given theme, or toggle when `None`.
    Theme(Option<Theme>),

    /// Display session statistics.
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be sent as a regular message.
///
/// # Examples
///
/// ```
/// # use supportchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/theme dark").is_some());
/// assert!(parse_command("How do I reset my password?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        "theme" => match argument {
            None => ChatCommand::Theme(None),
            Some(arg) => match arg.parse::<Theme>() {
                Ok(theme) => ChatCommand::Theme(Some(theme)),
                Err(err) => ChatCommand::Invalid(format!("/theme: {err}")),
            },
        },
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum LineInput<'a> {
    /// Nothing but whitespace; ignored.
    Blank,
    /// A slash command.
    Command(ChatCommand),
    /// A message for the support agent, exactly as typed.
    Message(&'a str),
}

/// Classifies a line of user input.
///
/// Whitespace only decides whether the line is blank or a command; a message
/// keeps it.
pub fn classify_line(line: &str) -> LineInput<'_> {
    if line.trim().is_empty() {
        return LineInput::Blank;
    }
    match parse_command(line) {
        Some(command) => LineInput::Command(command),
        None => LineInput::Message(line),
    }
}

/// Returns the help text for the chat commands.
pub fn help_text() -> &'static str {
    "\
Commands:
  /theme [light|dark]  Switch theme (toggles without an argument)
  /stats               Show session statistics
  /help                Show this help
  /quit                Exit (also /exit, /q)

Keys (full-screen mode):
  Enter                Send the message
  Alt+Enter            Insert a newline
  PageUp/PageDown      Scroll the conversation
  Ctrl+T               Toggle theme
  Ctrl+C               Cancel a pending reply, or quit when idle
  Esc                  Quit"
}
