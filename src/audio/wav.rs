use std::io::Cursor;

use crate::error::RecordingError;

use super::chunk::AudioChunk;

/// Encode an ordered chunk sequence into a self-contained WAV byte buffer.
///
/// Pure and stateless: identical input always yields byte-identical output,
/// so flushed segments are reproducible in tests. The chunks must share one
/// sample format; a mixed-format sequence is a usage error, never silently
/// coerced.
pub fn encode_wav(chunks: &[AudioChunk]) -> Result<Vec<u8>, RecordingError> {
    let first = chunks.first().ok_or(RecordingError::EmptySegment)?;

    for chunk in &chunks[1..] {
        if !first.format_matches(chunk) {
            return Err(RecordingError::FormatMismatch(format!(
                "chunk {} is {}Hz/{}ch, expected {}Hz/{}ch",
                chunk.sequence_number,
                chunk.sample_rate,
                chunk.channel_count,
                first.sample_rate,
                first.channel_count
            )));
        }
    }

    let spec = hound::WavSpec {
        channels: first.channel_count,
        sample_rate: first.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| RecordingError::Encoding(format!("failed to create WAV writer: {e}")))?;

        for chunk in chunks {
            for bytes in chunk.payload.chunks_exact(2) {
                let sample = i16::from_le_bytes([bytes[0], bytes[1]]);
                writer
                    .write_sample(sample)
                    .map_err(|e| RecordingError::Encoding(format!("failed to write sample: {e}")))?;
            }
        }

        writer
            .finalize()
            .map_err(|e| RecordingError::Encoding(format!("failed to finalize WAV: {e}")))?;
    }

    Ok(cursor.into_inner())
}
