use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::RecordingError;

use super::ObjectStorage;

/// A stored object with its content type, as held by [`MemoryStorage`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// In-memory object storage used by integration tests and demos.
///
/// Can be scripted to fail the next `put` to exercise the buffer-retention
/// retry path.
#[derive(Default, Clone)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

#[derive(Default)]
struct MemoryStorageInner {
    buckets: HashMap<String, HashMap<String, StoredObject>>,
    fail_next_put: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `put` call fail with a `Storage` error.
    pub async fn fail_next_put(&self) {
        self.inner.lock().await.fail_next_put = true;
    }

    /// Keys stored in a bucket, in insertion-independent sorted order.
    pub async fn keys(&self, bucket: &str) -> Vec<String> {
        let inner = self.inner.lock().await;
        let mut keys: Vec<String> = inner
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub async fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let inner = self.inner.lock().await;
        inner.buckets.get(bucket).and_then(|objects| objects.get(key)).cloned()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, RecordingError> {
        Ok(self.inner.lock().await.buckets.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), RecordingError> {
        self.inner
            .lock()
            .await
            .buckets
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), RecordingError> {
        let mut inner = self.inner.lock().await;
        if inner.fail_next_put {
            inner.fail_next_put = false;
            return Err(RecordingError::Storage("injected put failure".to_string()));
        }
        inner.buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
