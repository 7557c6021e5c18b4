//! Channel and username validation.
//!
//! Both identifiers share one rule set: trimmed, non-empty, at most 32
//! characters, and drawn from `[A-Za-z0-9_-]`. Channel names are then
//! uppercased so every comparison and every wire tag is case-normalized.
//!
//! The results are wrapped in [`Username`] and [`ChannelName`]. These
//! newtypes can only be built through validation, so anything holding one
//! is already known to be safe to put on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IdentifierKind, InvalidReason, ProtocolError};

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Longest accepted channel name, in characters.
pub const MAX_CHANNEL_LENGTH: usize = 32;

/// A validated username. Case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A validated channel name. Always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

impl ChannelName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validates a username.
///
/// Surrounding whitespace is trimmed; the remaining text is returned as-is.
///
/// # Errors
/// Returns [`ProtocolError::InvalidInput`] if the trimmed value is empty,
/// longer than [`MAX_USERNAME_LENGTH`], or contains characters outside
/// `[A-Za-z0-9_-]`.
pub fn validate_username(input: &str) -> Result<Username, ProtocolError> {
    let name = check_identifier(input, IdentifierKind::Username, MAX_USERNAME_LENGTH)?;
    Ok(Username(name.to_string()))
}

/// Validates a channel name and normalizes it to uppercase.
///
/// # Errors
/// Same rules as [`validate_username`], with [`MAX_CHANNEL_LENGTH`].
pub fn validate_channel(input: &str) -> Result<ChannelName, ProtocolError> {
    let name = check_identifier(input, IdentifierKind::Channel, MAX_CHANNEL_LENGTH)?;
    Ok(ChannelName(name.to_ascii_uppercase()))
}

fn check_identifier(
    input: &str,
    kind: IdentifierKind,
    max: usize,
) -> Result<&str, ProtocolError> {
    let trimmed = input.trim();
    let invalid = |reason| ProtocolError::InvalidInput { kind, reason };

    if trimmed.is_empty() {
        return Err(invalid(InvalidReason::Empty));
    }
    if trimmed.chars().count() > max {
        return Err(invalid(InvalidReason::TooLong { max }));
    }
    if !trimmed.chars().all(is_identifier_char) {
        return Err(invalid(InvalidReason::InvalidCharacters));
    }
    Ok(trimmed)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl TryFrom<String> for Username {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_username(&value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_channel(&value)
    }
}

impl From<ChannelName> for String {
    fn from(value: ChannelName) -> Self {
        value.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
