//! MessagePack codec helpers.
//!
//! All rift wire payloads are MessagePack. [`encode`]/[`decode`] work on raw
//! byte slices; [`decode_message`] unwraps an inbound NATS message directly.

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// Encode a value to MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    rmp_serde::to_vec(value).map_err(NetError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetError> {
    rmp_serde::from_slice(bytes).map_err(NetError::Decode)
}

/// Decode the payload of an inbound NATS message.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if the payload is not a valid `T`.
pub fn decode_message<T: for<'a> Deserialize<'a>>(
    message: &async_nats::Message,
) -> Result<T, NetError> {
    decode(&message.payload)
}
