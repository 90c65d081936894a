//! Live fan-out of inbound audio chunks to monitoring observers.
//!
//! The broadcast path is independent of the storage path: every chunk is
//! mirrored to subscribers in near-real-time regardless of flush state, and
//! a slow or disconnected observer never blocks ingestion.

pub mod hub;
pub mod messages;

pub use hub::{BroadcastHub, ObserverId};
pub use messages::AudioChunkEvent;
