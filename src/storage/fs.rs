use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::error::RecordingError;

use super::ObjectStorage;

/// Filesystem-backed object storage: a bucket is a directory under `root`,
/// an object a file under it. Writes go to a temporary sibling and are
/// renamed into place so readers never observe a partial object.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_path(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }
}

#[async_trait]
impl ObjectStorage for FsStorage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, RecordingError> {
        Ok(self.bucket_path(bucket).is_dir())
    }

    async fn make_bucket(&self, bucket: &str) -> Result<(), RecordingError> {
        let path = self.bucket_path(bucket);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| RecordingError::Storage(format!("failed to create bucket {bucket}: {e}")))?;
        info!("Created storage bucket: {}", path.display());
        Ok(())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), RecordingError> {
        let object_path = self.bucket_path(bucket).join(key);

        if let Some(parent) = object_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RecordingError::Storage(format!("failed to create prefix for {key}: {e}")))?;
        }

        let tmp_path = temp_sibling(&object_path);
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| RecordingError::Storage(format!("failed to write {key}: {e}")))?;

        // Rename is atomic on the same filesystem.
        tokio::fs::rename(&tmp_path, &object_path)
            .await
            .map_err(|e| RecordingError::Storage(format!("failed to commit {key}: {e}")))?;

        Ok(())
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}
