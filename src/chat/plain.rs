//! Line-oriented output for terminals without full-screen support.
//!
//! Rows come from the [`TranscriptRenderer`] like they do for the full-screen
//! view; this module only decides how each one is written: user rows are
//! padded to the right edge, time stamps are dimmed, and errors go out in
//! red when color is enabled.

use std::io::{self, Stdout, Write};

use unicode_width::UnicodeWidthStr;

use crate::chat::render::{Alignment, Row, RowKind, TranscriptRenderer, LOADING_MARKER};
use crate::chat::theme::Theme;
use crate::chat::transcript::{Role, Transcript};

/// ANSI escape code for dim text (used for time stamps and the loading row).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for blue text (user messages, light theme).
const ANSI_BLUE: &str = "\x1b[34m";

/// ANSI escape code for yellow text (user messages, dark theme).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (errors).
const ANSI_RED: &str = "\x1b[31m";

/// Writes transcript rows as plain lines.
pub struct PlainPrinter<W: Write = Stdout> {
    out: W,
    renderer: TranscriptRenderer,
    width: usize,
    use_color: bool,
    theme: Theme,
    printed: usize,
    loading_shown: bool,
}

impl PlainPrinter<Stdout> {
    /// Creates a printer on stdout.
    pub fn new(renderer: TranscriptRenderer, width: usize, use_color: bool) -> Self {
        Self::with_writer(io::stdout(), renderer, width, use_color)
    }
}

impl<W: Write> PlainPrinter<W> {
    /// Creates a printer on an arbitrary writer.
    pub fn with_writer(out: W, renderer: TranscriptRenderer, width: usize, use_color: bool) -> Self {
        Self {
            out,
            renderer,
            width: width.max(1),
            use_color,
            theme: Theme::default(),
            printed: 0,
            loading_shown: false,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Updates the width rows are laid out for.
    pub fn set_width(&mut self, width: usize) {
        self.width = width.max(1);
    }

    /// Prints every message appended since the last call.
    pub fn print_new_messages(&mut self, transcript: &Transcript) -> io::Result<()> {
        let messages = transcript.messages();
        if self.printed > messages.len() {
            self.printed = 0;
        }
        let rows = self
            .renderer
            .render_messages(&messages[self.printed..], self.width);
        self.printed = messages.len();
        self.print_rows(&rows)
    }

    /// Prints a run of rows, one line each.
    pub fn print_rows(&mut self, rows: &[Row]) -> io::Result<()> {
        self.clear_loading()?;
        for row in rows {
            self.print_row(row)?;
        }
        self.out.flush()
    }

    /// Shows the loading marker on the current line until the next output.
    pub fn print_loading(&mut self) -> io::Result<()> {
        if self.loading_shown {
            return Ok(());
        }
        if self.use_color {
            write!(self.out, "{ANSI_DIM}{LOADING_MARKER}{ANSI_RESET}")?;
        } else {
            write!(self.out, "{LOADING_MARKER}")?;
        }
        self.loading_shown = true;
        self.out.flush()
    }

    /// Erases the loading marker, if shown.
    pub fn clear_loading(&mut self) -> io::Result<()> {
        if self.loading_shown {
            let blank = " ".repeat(LOADING_MARKER.width());
            write!(self.out, "\r{blank}\r")?;
            self.loading_shown = false;
        }
        Ok(())
    }

    pub fn print_error(&mut self, error: &str) -> io::Result<()> {
        self.clear_loading()?;
        if self.use_color {
            writeln!(self.out, "{ANSI_RED}Error: {error}{ANSI_RESET}")?;
        } else {
            writeln!(self.out, "Error: {error}")?;
        }
        self.out.flush()
    }

    pub fn print_info(&mut self, info: &str) -> io::Result<()> {
        self.clear_loading()?;
        for line in info.lines() {
            writeln!(self.out, "    {line}")?;
        }
        self.out.flush()
    }

    /// Consumes the printer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_row(&mut self, row: &Row) -> io::Result<()> {
        let pad = match row.alignment {
            Alignment::Left => 0,
            Alignment::Right => self.width.saturating_sub(row.text.width()),
        };
        let style = if !self.use_color {
            None
        } else {
            match (row.kind, row.role) {
                (RowKind::Time | RowKind::Loading, _) => Some(ANSI_DIM),
                (RowKind::Body, Some(Role::User)) => Some(self.accent()),
                _ => None,
            }
        };
        let indent = " ".repeat(pad);
        match style {
            Some(style) if !row.text.is_empty() => {
                writeln!(self.out, "{indent}{style}{}{ANSI_RESET}", row.text)
            }
            _ => writeln!(self.out, "{indent}{}", row.text),
        }
    }

    fn accent(&self) -> &'static str {
        match self.theme {
            Theme::Light => ANSI_BLUE,
            Theme::Dark => ANSI_YELLOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::transcript::Message;
    use time::macros::datetime;

    fn printer(use_color: bool) -> PlainPrinter<Vec<u8>> {
        PlainPrinter::with_writer(Vec::new(), TranscriptRenderer::utc(), 40, use_color)
    }

    fn output(printer: PlainPrinter<Vec<u8>>) -> String {
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn user_rows_are_right_aligned() {
        let mut transcript = Transcript::new();
        transcript.seed(Message::bot("Hi", datetime!(2024-08-01 15:04:05 UTC)));
        transcript.push(Message::user("Hello", datetime!(2024-08-01 15:04:30 UTC)));

        let mut printer = printer(false);
        printer.print_new_messages(&transcript).unwrap();
        let out = output(printer);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Hi");
        assert_eq!(lines[1], "3:04:05 PM");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], format!("{}Hello", " ".repeat(35)));
        assert_eq!(lines[4].trim_start(), "3:04:30 PM");
        assert_eq!(lines[4].len(), 40);
    }

    #[test]
    fn only_new_messages_are_printed() {
        let mut transcript = Transcript::new();
        transcript.seed(Message::bot("Hi", datetime!(2024-08-01 15:04:05 UTC)));

        let mut printer = printer(false);
        printer.print_new_messages(&transcript).unwrap();
        printer.print_new_messages(&transcript).unwrap();
        transcript.push(Message::user("Hello", datetime!(2024-08-01 15:04:30 UTC)));
        printer.print_new_messages(&transcript).unwrap();

        let out = output(printer);
        assert_eq!(out.matches("Hi\n").count(), 1);
        assert_eq!(out.matches("Hello\n").count(), 1);
    }

    #[test]
    fn loading_marker_is_erased() {
        let mut printer = printer(false);
        printer.print_loading().unwrap();
        printer.print_loading().unwrap();
        printer.print_error("Failed to send message. Please try again.").unwrap();
        let out = output(printer);
        assert_eq!(
            out,
            "...\r   \rError: Failed to send message. Please try again.\n"
        );
    }

    #[test]
    fn color_follows_theme() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("Hello", datetime!(2024-08-01 15:04:30 UTC)));

        let mut light = printer(true);
        light.print_new_messages(&transcript).unwrap();
        assert!(output(light).contains(ANSI_BLUE));

        let mut dark = printer(true);
        dark.set_theme(Theme::Dark);
        dark.print_new_messages(&transcript).unwrap();
        let out = output(dark);
        assert!(out.contains(ANSI_YELLOW));
        assert!(out.contains(ANSI_DIM));
    }

    #[test]
    fn no_escape_codes_without_color() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("Hello", datetime!(2024-08-01 15:04:30 UTC)));
        let mut printer = printer(false);
        printer.print_new_messages(&transcript).unwrap();
        printer.print_error("boom").unwrap();
        assert!(!output(printer).contains('\x1b'));
    }
}
