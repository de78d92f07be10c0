//! The ordered list of messages shown in the chat view.

use time::OffsetDateTime;

/// Who wrote a transcript message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person at the keyboard.
    User,
    /// The support agent (the model).
    Bot,
}

/// A single transcript entry.  Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
    role: Role,
    timestamp: OffsetDateTime,
}

impl Message {
    /// Creates a message authored by the user.
    pub fn user(text: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        Self {
            text: text.into(),
            role: Role::User,
            timestamp,
        }
    }

    /// Creates a message authored by the bot.
    pub fn bot(text: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        Self {
            text: text.into(),
            role: Role::Bot,
            timestamp,
        }
    }

    /// The message body, exactly as typed or received.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The author.
    pub fn role(&self) -> Role {
        self.role
    }

    /// When the message entered the transcript.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }
}

/// Append-only sequence of messages in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with a single seed message.
    pub fn seed(&mut self, message: Message) {
        self.messages.clear();
        self.messages.push(message);
    }

    /// Appends a message at the end.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The newest message, if any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages with the given role.
    pub fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn seed_then_append_keeps_order() {
        let t0 = datetime!(2024-08-01 9:00:00 UTC);
        let mut transcript = Transcript::new();
        transcript.push(Message::user("stale", t0));
        transcript.seed(Message::bot("Hi", t0));
        transcript.push(Message::user("Hello", t0));
        transcript.push(Message::bot("Hi there!", t0));

        let texts: Vec<&str> = transcript.messages().iter().map(Message::text).collect();
        assert_eq!(texts, vec!["Hi", "Hello", "Hi there!"]);
        assert_eq!(transcript.count(Role::Bot), 2);
        assert_eq!(transcript.count(Role::User), 1);
        assert_eq!(transcript.last().map(Message::role), Some(Role::Bot));
    }
}
