pub mod buffer;
pub mod chunk;
pub mod wav;

pub use buffer::ChunkBuffer;
pub use chunk::{AudioChunk, SampleEncoding, BYTES_PER_SAMPLE};
pub use wav::encode_wav;
