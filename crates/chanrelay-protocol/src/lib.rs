//! Wire protocol for chanrelay.
//!
//! This crate defines what travels between clients and the relay:
//!
//! - **Validation** ([`validate_username`], [`validate_channel`]): the
//!   identifier rules, producing [`Username`] and [`ChannelName`].
//! - **Messages** ([`ChatMessage`], [`ChannelSubscription`]): the one domain
//!   entity and the client-side broadcast filter.
//! - **Codec** ([`Codec`] trait, [`LineCodec`]): how messages become
//!   `[CHANNEL] username: content` frames and how frames are read back.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer knows nothing about sockets. It sits between the
//! transport (opaque frames) and the relay/client loops:
//!
//! ```text
//! Transport (frames) → Protocol (Decoded / ChatMessage) → Relay, Client
//! ```

mod codec;
mod error;
mod message;
mod validate;

pub use codec::{Codec, Decoded, LineCodec, ParsedMessage};
pub use error::{IdentifierKind, InvalidReason, ProtocolError};
pub use message::{ChannelSubscription, ChatMessage};
pub use validate::{
    validate_channel, validate_username, ChannelName, Username, MAX_CHANNEL_LENGTH,
    MAX_USERNAME_LENGTH,
};
