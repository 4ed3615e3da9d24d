//! # rift_data
//!
//! Durable participant state for the rift simulation: record types, the
//! opaque document-store contract with memory and file-backed stores, the
//! observer-visible record mirror, and the persistence synchronizer that
//! keeps store, mirror, and remote participant copies consistent.

pub mod mirror;
pub mod record;
pub mod store;
pub mod sync;

pub use mirror::MirrorStore;
pub use record::{default_record, record_key, validate_record, ParticipantId, PlayerRecord, Vitality};
pub use store::{
    DocumentHandle, DocumentStore, JsonFileStore, MemoryStore, StoreError,
};
pub use sync::{
    sync_channel, SessionControl, SyncChannel, SyncClient, SyncCommand, Synchronizer,
    TERMINATE_LOAD_FAILED,
};
