//! Recording lifecycle supervision
//!
//! This module owns the per-participant recording state machine and the
//! shared flush pipeline:
//! - Start/stop of external egress jobs per participant track
//! - Chunk ingestion: buffer, counters, threshold flush, live broadcast
//! - Periodic reconciliation against the egress service's job list
//! - Finalization on stop, track end, disconnect and shutdown

mod state;
mod supervisor;

pub use state::{RecordingState, RecordingStatus};
pub use supervisor::{RecordingSupervisor, SupervisorConfig};
