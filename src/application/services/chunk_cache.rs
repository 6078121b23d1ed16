use std::path::{Path, PathBuf};

use crate::application::ports::VerboseTranscription;

/// Per-job on-disk cache of raw transcription responses, keyed by chunk
/// index. A retried job re-reads prior successes instead of calling the
/// service again.
///
/// Writes go to a temp path and are renamed into place so a cancelled
/// attempt never leaves a partial file behind.
#[derive(Debug, Clone)]
pub struct ChunkCache {
    dir: PathBuf,
}

impl ChunkCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("chunk_{:03}.json", index))
    }

    pub async fn load(&self, index: usize) -> Option<VerboseTranscription> {
        let path = self.entry_path(index);
        let raw = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(
                    chunk = index,
                    error = %e,
                    "Discarding unreadable cache entry"
                );
                let _ = tokio::fs::remove_file(&path).await;
                None
            }
        }
    }

    pub async fn store(
        &self,
        index: usize,
        payload: &VerboseTranscription,
    ) -> Result<(), ChunkCacheError> {
        let path = self.entry_path(index);
        let tmp = path.with_extension("json.tmp");

        let raw = serde_json::to_vec(payload)?;
        tokio::fs::write(&tmp, &raw).await?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(())
    }

    pub async fn remove(&self, index: usize) {
        let _ = tokio::fs::remove_file(self.entry_path(index)).await;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkCacheError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::VerboseSegment;

    fn sample() -> VerboseTranscription {
        VerboseTranscription {
            task: "transcribe".to_string(),
            language: "en".to_string(),
            duration: 12.5,
            text: "hello there".to_string(),
            segments: vec![VerboseSegment {
                id: 0,
                start: 0.0,
                end: 12.5,
                text: "hello there".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn stores_and_reloads_payload() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChunkCache::new(dir.path());

        cache.store(3, &sample()).await.unwrap();
        let loaded = cache.load(3).await.unwrap();

        assert_eq!(loaded.text, "hello there");
        assert_eq!(loaded.segments.len(), 1);
    }

    #[tokio::test]
    async fn missing_entry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChunkCache::new(dir.path());
        assert!(cache.load(1).await.is_none());
    }

    #[tokio::test]
    async fn corrupt_entry_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChunkCache::new(dir.path());

        tokio::fs::write(dir.path().join("chunk_002.json"), b"not json")
            .await
            .unwrap();

        assert!(cache.load(2).await.is_none());
        assert!(!dir.path().join("chunk_002.json").exists());
    }

    #[tokio::test]
    async fn no_temp_file_left_after_store() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ChunkCache::new(dir.path());

        cache.store(1, &sample()).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["chunk_001.json"]);
    }
}
