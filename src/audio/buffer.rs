use tracing::warn;

use super::chunk::AudioChunk;

/// Ordered audio chunks for a single participant, accumulated until a flush
/// threshold is reached.
///
/// Each buffer has exactly one writer (that participant's ingress task);
/// buffers for distinct participants are fully independent.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<AudioChunk>,
    total_samples: usize,
    /// Highest sequence number ever accepted. Survives `drain` so ordering
    /// checks span segment boundaries.
    last_sequence: Option<u64>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk to the tail of the sequence.
    ///
    /// A repeated or regressed sequence number is a protocol violation: the
    /// chunk is logged and rejected (returns `false`) so the ordering of
    /// subsequent in-order chunks stays intact. Gaps are tolerated.
    pub fn append(&mut self, chunk: AudioChunk) -> bool {
        if let Some(last) = self.last_sequence {
            if chunk.sequence_number <= last {
                warn!(
                    participant = %chunk.participant_id,
                    sequence = chunk.sequence_number,
                    last_sequence = last,
                    "protocol violation: sequence number repeated or regressed, dropping chunk"
                );
                return false;
            }
        }

        self.last_sequence = Some(chunk.sequence_number);
        self.total_samples += chunk.sample_count();
        self.chunks.push(chunk);
        true
    }

    /// Total buffered audio in seconds, computed from sample counts so
    /// network jitter cannot distort duration accounting.
    pub fn duration(&self) -> f64 {
        match self.chunks.first() {
            Some(first) => {
                self.total_samples as f64
                    / (first.sample_rate as f64 * first.channel_count as f64)
            }
            None => 0.0,
        }
    }

    /// Atomically take and clear the full ordered sequence. Subsequent
    /// appends start a fresh sequence; the returned snapshot is unaffected
    /// by them.
    pub fn drain(&mut self) -> Vec<AudioChunk> {
        self.total_samples = 0;
        std::mem::take(&mut self.chunks)
    }

    /// Put a drained snapshot back at the front of the buffer, preserving
    /// order and sample accounting. Used when an upload fails so the audio
    /// is retried on the next flush instead of lost.
    pub fn restore(&mut self, mut snapshot: Vec<AudioChunk>) {
        if snapshot.is_empty() {
            return;
        }
        self.total_samples += snapshot.iter().map(|c| c.sample_count()).sum::<usize>();
        snapshot.append(&mut self.chunks);
        self.chunks = snapshot;
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Sequence numbers of the first and last buffered chunks, if any.
    pub fn sequence_span(&self) -> Option<(u64, u64)> {
        match (self.chunks.first(), self.chunks.last()) {
            (Some(first), Some(last)) => Some((first.sequence_number, last.sequence_number)),
            _ => None,
        }
    }
}
