//! Error types for the protocol layer.
//!
//! Only identifier validation can fail here. Decoding a wire line never
//! fails: malformed input comes back as [`Decoded::Raw`](crate::Decoded)
//! and the caller decides what to do with it.

use std::fmt;

/// Which identifier failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Username,
    Channel,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username => write!(f, "username"),
            Self::Channel => write!(f, "channel name"),
        }
    }
}

/// Why an identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// Nothing left after trimming whitespace.
    Empty,
    /// Longer than the allowed maximum (in characters).
    TooLong { max: usize },
    /// Contains something other than ASCII letters, digits, `_` or `-`.
    InvalidCharacters,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "cannot be empty"),
            Self::TooLong { max } => write!(f, "cannot exceed {max} characters"),
            Self::InvalidCharacters => write!(
                f,
                "can only contain letters, numbers, underscores, and hyphens"
            ),
        }
    }
}

/// Errors that can occur in the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A username or channel name failed validation.
    ///
    /// Raised at configuration time, before any connection is opened.
    #[error("{kind} {reason}")]
    InvalidInput {
        kind: IdentifierKind,
        reason: InvalidReason,
    },
}
