//! The chat message entity and the client-side channel subscription.

use std::fmt;

use crate::validate::{ChannelName, Username};

/// One chat message, as typed by a user.
///
/// Built only through [`ChatMessage::new`], which refuses blank content.
/// Fields are private and there are no setters: a message is serialized
/// right after creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    channel: ChannelName,
    username: Username,
    content: String,
}

impl ChatMessage {
    /// Creates a message from raw user input.
    ///
    /// The content is trimmed. Returns `None` when nothing is left, so
    /// whitespace-only input never turns into a message.
    pub fn new(channel: ChannelName, username: Username, content: &str) -> Option<Self> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }
        Some(Self {
            channel,
            username,
            content: content.to_string(),
        })
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// The broadcast filter held by a client: the bracketed tag `[CHANNEL]`.
///
/// A broadcast frame belongs to the subscription when it starts with the
/// tag bytes. The closing bracket is part of the tag, so `[GLOBAL]` does
/// not match `[GLOBALX] ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSubscription {
    tag: String,
}

impl ChannelSubscription {
    pub fn new(channel: &ChannelName) -> Self {
        Self {
            tag: format!("[{channel}]"),
        }
    }

    /// The tag as it appears at the start of a wire line.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns `true` if `frame` is addressed to this channel.
    pub fn matches(&self, frame: &[u8]) -> bool {
        frame.starts_with(self.tag.as_bytes())
    }
}

impl fmt::Display for ChannelSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}
