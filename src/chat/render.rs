//! Turning the transcript into display rows.
//!
//! The renderer is a pure function of (transcript, loading flag, width): it
//! wraps each message into a bubble three quarters of the view wide, aligns
//! bot bubbles left and user bubbles right, and stamps each with its local
//! time of day.  Front-ends only decide how a [`Row`] is painted.

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::chat::transcript::{Message, Role, Transcript};

/// Placeholder text of the loading row; front-ends may animate it.
pub const LOADING_MARKER: &str = "...";

/// Horizontal placement of a row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Alignment {
    Left,
    Right,
}

impl From<Role> for Alignment {
    fn from(role: Role) -> Self {
        match role {
            Role::Bot => Alignment::Left,
            Role::User => Alignment::Right,
        }
    }
}

/// What a row shows.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// A wrapped line of message text.
    Body,
    /// The time-of-day stamp beneath a message.
    Time,
    /// The indicator shown while waiting for a reply.
    Loading,
    /// Blank separator between messages.
    Spacer,
}

/// One display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub kind: RowKind,
    pub alignment: Alignment,
    /// The author of the message this row belongs to.
    pub role: Option<Role>,
    pub text: String,
}

impl Row {
    fn spacer() -> Self {
        Self {
            kind: RowKind::Spacer,
            alignment: Alignment::Left,
            role: None,
            text: String::new(),
        }
    }

    fn loading() -> Self {
        Self {
            kind: RowKind::Loading,
            alignment: Alignment::Left,
            role: Some(Role::Bot),
            text: LOADING_MARKER.to_string(),
        }
    }
}

/// Lays out transcripts for a fixed local UTC offset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TranscriptRenderer {
    offset: UtcOffset,
}

impl TranscriptRenderer {
    /// Creates a renderer that shows times in `offset`.
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    /// Creates a renderer that shows times in UTC.
    pub fn utc() -> Self {
        Self::new(UtcOffset::UTC)
    }

    /// Renders the whole view: every message, then the loading row if any.
    pub fn render(&self, transcript: &Transcript, loading: bool, width: usize) -> Vec<Row> {
        let mut rows = self.render_messages(transcript.messages(), width);
        if loading {
            rows.push(Row::loading());
        }
        rows
    }

    /// Renders a run of messages.
    pub fn render_messages(&self, messages: &[Message], width: usize) -> Vec<Row> {
        messages
            .iter()
            .flat_map(|message| self.render_message(message, width))
            .collect()
    }

    /// Renders one message: its wrapped body, its time stamp, and a spacer.
    pub fn render_message(&self, message: &Message, width: usize) -> Vec<Row> {
        let alignment = Alignment::from(message.role());
        let role = Some(message.role());
        let mut rows: Vec<Row> = textwrap::wrap(message.text(), bubble_width(width))
            .into_iter()
            .map(|line| Row {
                kind: RowKind::Body,
                alignment,
                role,
                text: line.into_owned(),
            })
            .collect();
        rows.push(Row {
            kind: RowKind::Time,
            alignment,
            role,
            text: self.time_of_day(message.timestamp()),
        });
        rows.push(Row::spacer());
        rows
    }

    /// Formats a timestamp as a local time of day, e.g. `3:04:05 PM`.
    pub fn time_of_day(&self, timestamp: OffsetDateTime) -> String {
        let format = format_description!("[hour repr:12 padding:none]:[minute]:[second] [period]");
        timestamp
            .to_offset(self.offset)
            .format(&format)
            .unwrap_or_default()
    }
}

impl Default for TranscriptRenderer {
    fn default() -> Self {
        Self::utc()
    }
}

/// Width of a message bubble for a view `width` columns wide.
pub fn bubble_width(width: usize) -> usize {
    (width * 3 / 4).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    fn transcript() -> Transcript {
        let mut transcript = Transcript::new();
        transcript.seed(Message::bot("Hi, how can I help?", datetime!(2024-08-01 15:04:05 UTC)));
        transcript.push(Message::user("Hello", datetime!(2024-08-01 15:04:30 UTC)));
        transcript
    }

    #[test]
    fn alignment_follows_role() {
        let rows = TranscriptRenderer::utc().render(&transcript(), false, 80);
        for row in rows.iter().filter(|r| r.kind != RowKind::Spacer) {
            match row.role {
                Some(Role::Bot) => assert_eq!(row.alignment, Alignment::Left),
                Some(Role::User) => assert_eq!(row.alignment, Alignment::Right),
                None => panic!("content row without role"),
            }
        }
        let kinds: Vec<RowKind> = rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::Body,
                RowKind::Time,
                RowKind::Spacer,
                RowKind::Body,
                RowKind::Time,
                RowKind::Spacer
            ]
        );
    }

    #[test]
    fn rendering_is_idempotent() {
        let renderer = TranscriptRenderer::new(offset!(-7));
        let transcript = transcript();
        assert_eq!(
            renderer.render(&transcript, true, 40),
            renderer.render(&transcript, true, 40)
        );
    }

    #[test]
    fn loading_row_follows_last_message() {
        let rows = TranscriptRenderer::utc().render(&transcript(), true, 80);
        let last = rows.last().unwrap();
        assert_eq!(last.kind, RowKind::Loading);
        assert_eq!(last.alignment, Alignment::Left);
        assert_eq!(last.text, LOADING_MARKER);

        let rows = TranscriptRenderer::utc().render(&transcript(), false, 80);
        assert!(rows.iter().all(|r| r.kind != RowKind::Loading));
    }

    #[test]
    fn time_of_day_uses_offset() {
        let stamp = datetime!(2024-08-01 15:04:05 UTC);
        assert_eq!(TranscriptRenderer::utc().time_of_day(stamp), "3:04:05 PM");
        assert_eq!(
            TranscriptRenderer::new(offset!(-7)).time_of_day(stamp),
            "8:04:05 AM"
        );
        assert_eq!(
            TranscriptRenderer::utc().time_of_day(datetime!(2024-08-01 0:30:00 UTC)),
            "12:30:00 AM"
        );
    }

    #[test]
    fn long_messages_wrap_inside_bubble() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user(
            "the quick brown fox jumps over the lazy dog",
            datetime!(2024-08-01 9:00:00 UTC),
        ));
        let rows = TranscriptRenderer::utc().render(&transcript, false, 20);
        let body: Vec<&Row> = rows.iter().filter(|r| r.kind == RowKind::Body).collect();
        assert!(body.len() > 1);
        assert!(body.iter().all(|r| r.text.chars().count() <= bubble_width(20)));
    }

    #[test]
    fn empty_message_still_renders() {
        let mut transcript = Transcript::new();
        transcript.push(Message::user("", datetime!(2024-08-01 9:00:00 UTC)));
        let rows = TranscriptRenderer::utc().render(&transcript, false, 80);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].kind, RowKind::Body);
    }
}
