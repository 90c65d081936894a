//! WebSocket ingress for egress audio streams and monitoring observers.
//!
//! Two accept points:
//! - `/audio-stream?track_id=&room=&participant=`: one duplex connection per
//!   recorded track. Binary frames are raw PCM audio; text frames are JSON
//!   control messages.
//! - `/monitor`: passive observers receiving a live mirror of every chunk
//!   plus recording status on request.

pub mod monitor;
pub mod stream;

pub use monitor::monitor_handler;
pub use stream::audio_stream_handler;
