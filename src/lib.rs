pub mod audio;
pub mod broadcast;
pub mod config;
pub mod egress;
pub mod error;
pub mod http;
pub mod ingress;
pub mod storage;
pub mod supervisor;

pub use audio::{encode_wav, AudioChunk, ChunkBuffer, SampleEncoding};
pub use broadcast::{AudioChunkEvent, BroadcastHub, ObserverId};
pub use config::Config;
pub use egress::{EgressClient, EgressJobState, EgressJobStatus, HttpEgressClient};
pub use error::RecordingError;
pub use http::{create_router, AppState, StreamSettings};
pub use storage::{segment_key, FsStorage, MemoryStorage, ObjectStorage};
pub use supervisor::{RecordingState, RecordingStatus, RecordingSupervisor, SupervisorConfig};
