//! # rift_net
//!
//! The external surface of the rift simulation core:
//!
//! - [`session`] — join/leave/defeated signals and the in-process
//!   subscription bus delivering them.
//! - [`messages`] — wire message types for record synchronization and
//!   session signalling.
//! - [`subjects`] — NATS subject hierarchy constants and builders.
//! - [`codec`] — MessagePack serialisation/deserialisation helpers.
//! - [`connection`] — NATS connection management.
//! - [`channel`] — NATS-backed sync-channel and session-control
//!   collaborators.
//! - [`error`] — network-layer error types.

pub mod channel;
pub mod codec;
pub mod connection;
pub mod error;
pub mod messages;
pub mod session;
pub mod subjects;

pub use channel::{NatsSessionControl, NatsSyncChannel};
pub use codec::{decode, decode_message, encode};
pub use connection::NatsConnection;
pub use error::NetError;
pub use session::{ResourceId, SessionBus, SessionEvent, SubscriptionId};
