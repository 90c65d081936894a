// End-to-end pipeline tests: ingest, threshold flush, finalization,
// and buffer retention across a failed upload.

mod common;

use anyhow::Result;
use common::{make_chunk, test_supervisor, TEST_BUCKET};
use trackrec::RecordingStatus;

#[tokio::test]
async fn threshold_flush_uploads_one_segment() -> Result<()> {
    // 10 chunks of 0.6s each against a 5s threshold: the flush fires while
    // ingesting the 9th chunk (cumulative 5.4s >= 5s).
    let (supervisor, storage, _egress) = test_supervisor(5.0).await;
    supervisor.start("p1", "track-1").await?;

    for seq in 0..10u64 {
        supervisor.ingest_chunk(make_chunk("p1", seq, 0.6)).await;
    }

    let keys = storage.keys(TEST_BUCKET).await;
    assert_eq!(keys.len(), 1, "exactly one flush expected, got {:?}", keys);
    assert!(
        keys[0].starts_with("participants/test-room/p1/chunk_0_8_"),
        "unexpected key {}",
        keys[0]
    );
    assert!(keys[0].ends_with(".wav"));

    // Only the 10th chunk remains buffered
    assert_eq!(supervisor.buffered_chunks("p1").await, 1);

    let state = supervisor.status("p1").await.expect("state exists");
    assert_eq!(state.chunks_received, 10);
    assert!((state.accumulated_duration_seconds - 6.0).abs() < 1e-6);
    Ok(())
}

#[tokio::test]
async fn flushed_segment_is_valid_wav() -> Result<()> {
    let (supervisor, storage, _egress) = test_supervisor(1.0).await;
    supervisor.start("p1", "track-1").await?;

    supervisor.ingest_chunk(make_chunk("p1", 0, 0.6)).await;
    supervisor.ingest_chunk(make_chunk("p1", 1, 0.6)).await;

    let keys = storage.keys(TEST_BUCKET).await;
    assert_eq!(keys.len(), 1);

    let object = storage.object(TEST_BUCKET, &keys[0]).await.expect("object stored");
    assert_eq!(object.content_type, "audio/wav");

    let reader = hound::WavReader::new(std::io::Cursor::new(object.bytes))?;
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 48_000);
    assert_eq!(spec.channels, 1);
    assert_eq!(reader.len() as usize, 2 * 28_800); // 1.2s of 48kHz mono
    Ok(())
}

#[tokio::test]
async fn finalize_flushes_remaining_audio_and_completes() -> Result<()> {
    // 3 chunks totalling well under the threshold, then an abrupt
    // disconnect: finalization must flush exactly those chunks.
    let (supervisor, storage, _egress) = test_supervisor(5.0).await;
    supervisor.start("p1", "track-1").await?;

    for seq in 0..3u64 {
        supervisor.ingest_chunk(make_chunk("p1", seq, 0.667)).await;
    }
    assert!(storage.keys(TEST_BUCKET).await.is_empty());

    supervisor.finalize("p1").await;

    let keys = storage.keys(TEST_BUCKET).await;
    assert_eq!(keys.len(), 1);
    assert!(
        keys[0].starts_with("participants/test-room/p1/chunk_0_2_"),
        "unexpected key {}",
        keys[0]
    );
    assert_eq!(supervisor.buffered_chunks("p1").await, 0);

    let state = supervisor.status("p1").await.expect("state exists");
    assert_eq!(state.status, RecordingStatus::Completed);
    assert!(state.completed_at.is_some());
    Ok(())
}

#[tokio::test]
async fn finalize_with_empty_buffer_still_completes() -> Result<()> {
    let (supervisor, storage, _egress) = test_supervisor(5.0).await;
    supervisor.start("p1", "track-1").await?;

    supervisor.finalize("p1").await;

    assert!(storage.keys(TEST_BUCKET).await.is_empty());
    assert_eq!(
        supervisor.status("p1").await.unwrap().status,
        RecordingStatus::Completed
    );

    // Finalization is idempotent on a terminal state
    supervisor.finalize("p1").await;
    assert_eq!(
        supervisor.status("p1").await.unwrap().status,
        RecordingStatus::Completed
    );
    Ok(())
}

#[tokio::test]
async fn failed_upload_retains_audio_for_next_flush() -> Result<()> {
    let (supervisor, storage, _egress) = test_supervisor(1.0).await;
    supervisor.start("p1", "track-1").await?;

    // The first threshold crossing hits an injected storage failure
    storage.fail_next_put().await;
    supervisor.ingest_chunk(make_chunk("p1", 0, 0.6)).await;
    supervisor.ingest_chunk(make_chunk("p1", 1, 0.6)).await;

    assert!(storage.keys(TEST_BUCKET).await.is_empty());
    assert_eq!(
        supervisor.buffered_chunks("p1").await,
        2,
        "unflushed chunks must be retained after a storage failure"
    );

    // The next crossing flushes everything, nothing lost
    supervisor.ingest_chunk(make_chunk("p1", 2, 0.6)).await;

    let keys = storage.keys(TEST_BUCKET).await;
    assert_eq!(keys.len(), 1);
    assert!(
        keys[0].starts_with("participants/test-room/p1/chunk_0_2_"),
        "unexpected key {}",
        keys[0]
    );
    assert_eq!(supervisor.buffered_chunks("p1").await, 0);
    Ok(())
}

#[tokio::test]
async fn regressed_sequence_does_not_corrupt_pipeline() -> Result<()> {
    let (supervisor, storage, _egress) = test_supervisor(5.0).await;
    supervisor.start("p1", "track-1").await?;

    supervisor.ingest_chunk(make_chunk("p1", 0, 0.5)).await;
    supervisor.ingest_chunk(make_chunk("p1", 1, 0.5)).await;
    // Protocol violation: repeated sequence number
    supervisor.ingest_chunk(make_chunk("p1", 1, 0.5)).await;
    supervisor.ingest_chunk(make_chunk("p1", 2, 0.5)).await;

    assert_eq!(supervisor.buffered_chunks("p1").await, 3);

    let state = supervisor.status("p1").await.expect("state exists");
    assert_eq!(state.chunks_received, 3, "rejected chunk must not be counted");

    supervisor.finalize("p1").await;
    let keys = storage.keys(TEST_BUCKET).await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("participants/test-room/p1/chunk_0_2_"));
    Ok(())
}

#[tokio::test]
async fn participants_are_isolated() -> Result<()> {
    let (supervisor, storage, _egress) = test_supervisor(1.0).await;
    supervisor.start("p1", "track-1").await?;
    supervisor.start("p2", "track-2").await?;

    // p1's upload failure must not affect p2's flush
    storage.fail_next_put().await;
    supervisor.ingest_chunk(make_chunk("p1", 0, 1.2)).await;
    supervisor.ingest_chunk(make_chunk("p2", 0, 1.2)).await;

    let keys = storage.keys(TEST_BUCKET).await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].contains("/p2/"));
    assert_eq!(supervisor.buffered_chunks("p1").await, 1);
    assert_eq!(supervisor.buffered_chunks("p2").await, 0);
    Ok(())
}

#[tokio::test]
async fn restarted_recording_accepts_a_fresh_chunk_stream() -> Result<()> {
    // Each ingress connection numbers chunks from 0, so the second
    // recording's stream must not be rejected against the first one's
    // sequence history.
    let (supervisor, storage, _egress) = test_supervisor(60.0).await;

    supervisor.start("p1", "track-1").await?;
    for seq in 0..3u64 {
        supervisor.ingest_chunk(make_chunk("p1", seq, 0.5)).await;
    }
    supervisor.finalize("p1").await;
    assert_eq!(storage.keys(TEST_BUCKET).await.len(), 1);

    supervisor.start("p1", "track-1").await?;
    for seq in 0..4u64 {
        supervisor.ingest_chunk(make_chunk("p1", seq, 0.5)).await;
    }

    let state = supervisor.status("p1").await.expect("state exists");
    assert_eq!(
        state.chunks_received, 4,
        "second recording must buffer its own chunk stream"
    );
    assert_eq!(supervisor.buffered_chunks("p1").await, 4);

    supervisor.finalize("p1").await;
    let keys = storage.keys(TEST_BUCKET).await;
    assert_eq!(keys.len(), 2);
    assert!(keys
        .iter()
        .any(|k| k.starts_with("participants/test-room/p1/chunk_0_2_")));
    assert!(keys
        .iter()
        .any(|k| k.starts_with("participants/test-room/p1/chunk_0_3_")));
    assert_eq!(
        supervisor.status("p1").await.unwrap().status,
        RecordingStatus::Completed
    );
    Ok(())
}

#[tokio::test]
async fn shutdown_finalizes_active_recordings() -> Result<()> {
    let (supervisor, storage, _egress) = test_supervisor(60.0).await;
    supervisor.start("p1", "track-1").await?;
    supervisor.start("p2", "track-2").await?;

    supervisor.ingest_chunk(make_chunk("p1", 0, 0.5)).await;
    supervisor.ingest_chunk(make_chunk("p2", 0, 0.5)).await;

    supervisor.shutdown().await;

    assert_eq!(storage.keys(TEST_BUCKET).await.len(), 2);
    for participant in ["p1", "p2"] {
        assert_eq!(
            supervisor.status(participant).await.unwrap().status,
            RecordingStatus::Completed
        );
    }
    Ok(())
}
