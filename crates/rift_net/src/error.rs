//! Errors of the rift wire surface.

use thiserror::Error;

/// Anything that can go wrong between the simulation core and NATS.
#[derive(Debug, Error)]
pub enum NetError {
    /// A message would not serialise to MessagePack.
    #[error("message encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// An inbound payload was not valid MessagePack for the expected type.
    #[error("message decode failed: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Subscribing to a subject failed.
    #[error("subscribe failed: {0}")]
    Subscribe(#[from] async_nats::SubscribeError),

    /// Publishing to a subject failed.
    #[error("publish failed: {0}")]
    Publish(#[from] async_nats::PublishError),

    /// The NATS connection could not be established.
    #[error("connect failed: {0}")]
    Connect(#[from] async_nats::ConnectError),
}
