//! Codec trait and the line codec used on the wire.
//!
//! A wire line looks like this:
//!
//! ```text
//! [GLOBAL] alice: Hello world
//! ^^^^^^^^ ^^^^^  ^^^^^^^^^^^
//!  channel  user   content
//! ```
//!
//! Encoding is infallible because [`ChatMessage`] can only hold validated
//! identifiers and non-blank content. Decoding is infallible too: anything
//! that does not match the pattern comes back as [`Decoded::Raw`], which
//! carries no extractable content.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::message::ChatMessage;

/// `[CHANNEL]`, at least one space, `username:`, optional space, content.
static WIRE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]+)\]\s+([^:]+):\s*(.*)$").expect("wire line pattern is valid")
});

/// Converts chat messages to frames and frames back to structure.
///
/// The relay and the client are generic over this trait so the framing
/// can change without touching either loop.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a message into one frame.
    fn encode(&self, message: &ChatMessage) -> Vec<u8>;

    /// Parses a frame. Never fails; see [`Decoded`].
    fn decode(&self, data: &[u8]) -> Decoded;
}

/// The `[CHANNEL] username: content` line format.
///
/// ## Example
///
/// ```rust
/// use chanrelay_protocol::{validate_channel, validate_username, ChatMessage, Codec, LineCodec};
///
/// let message = ChatMessage::new(
///     validate_channel("general").unwrap(),
///     validate_username("alice").unwrap(),
///     "Hello world",
/// )
/// .unwrap();
///
/// let bytes = LineCodec.encode(&message);
/// assert_eq!(bytes, b"[GENERAL] alice: Hello world");
///
/// let decoded = LineCodec.decode(&bytes);
/// assert_eq!(decoded.content(), Some("Hello world"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LineCodec;

impl Codec for LineCodec {
    fn encode(&self, message: &ChatMessage) -> Vec<u8> {
        format!(
            "[{}] {}: {}",
            message.channel(),
            message.username(),
            message.content()
        )
        .into_bytes()
    }

    fn decode(&self, data: &[u8]) -> Decoded {
        // Invalid UTF-8 is replaced rather than rejected; the result then
        // either fails the pattern or is treated as plain text.
        let text: Cow<'_, str> = String::from_utf8_lossy(data);
        let raw = text.trim();

        match WIRE_LINE.captures(raw) {
            Some(caps) => Decoded::Parsed(ParsedMessage {
                channel: caps[1].to_string(),
                username: caps[2].to_string(),
                content: caps[3].to_string(),
                raw: raw.to_string(),
            }),
            None => Decoded::Raw(raw.to_string()),
        }
    }
}

/// The three fields pulled out of a well-formed wire line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub channel: String,
    pub username: String,
    /// May be empty; a sender that skipped trimming can produce this.
    pub content: String,
    /// The trimmed line the fields were taken from.
    pub raw: String,
}

/// Result of decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The frame matched the wire pattern.
    Parsed(ParsedMessage),
    /// The frame did not match; only the trimmed text is available.
    Raw(String),
}

impl Decoded {
    /// The trimmed message body, if there is one.
    ///
    /// `None` for raw frames and for parsed frames whose content is blank.
    /// The relay broadcasts a frame only when this returns `Some`.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Parsed(parsed) => {
                let content = parsed.content.trim();
                (!content.is_empty()).then_some(content)
            }
            Self::Raw(_) => None,
        }
    }

    /// The trimmed text of the frame, parsed or not.
    pub fn raw(&self) -> &str {
        match self {
            Self::Parsed(parsed) => &parsed.raw,
            Self::Raw(raw) => raw,
        }
    }
}
