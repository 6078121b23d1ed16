use std::path::{Path, PathBuf};

use super::JobId;

/// On-disk layout for one job.
///
/// Working state lives under `TEMP_DIR/job_{id}/` (accelerated master,
/// `chunks/`, `transcripts/` cache); artifacts land under
/// `OUTPUT_DIR/{id}/`. The working directory is owned exclusively by the
/// job's orchestrator.
#[derive(Debug, Clone)]
pub struct JobPaths {
    id: JobId,
    work_dir: PathBuf,
    output_dir: PathBuf,
}

impl JobPaths {
    pub fn new(temp_root: &Path, output_root: &Path, id: JobId) -> Self {
        Self {
            id,
            work_dir: temp_root.join(format!("job_{}", id)),
            output_dir: output_root.join(id.to_string()),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn source_path(&self, extension: &str) -> PathBuf {
        self.work_dir.join(format!("source.{}", extension))
    }

    pub fn accelerated_path(&self) -> PathBuf {
        self.work_dir.join("accelerated.wav")
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.work_dir.join("chunks")
    }

    pub fn transcripts_dir(&self) -> PathBuf {
        self.work_dir.join("transcripts")
    }

    pub fn chunk_path(&self, index: usize) -> PathBuf {
        self.chunks_dir().join(format!("chunk_{:03}.mp3", index))
    }

    pub fn srt_path(&self) -> PathBuf {
        self.output_dir.join("transcript.srt")
    }

    pub fn txt_path(&self) -> PathBuf {
        self.output_dir.join("transcript.txt")
    }

    pub fn result_path(&self) -> PathBuf {
        self.output_dir.join("result.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_keyed_by_job_id() {
        let id = JobId::new();
        let paths = JobPaths::new(Path::new("/tmp/qs"), Path::new("/tmp/out"), id);
        assert_eq!(
            paths.work_dir(),
            Path::new(&format!("/tmp/qs/job_{}", id)).to_path_buf()
        );
        assert!(paths
            .chunk_path(7)
            .ends_with(Path::new("chunks/chunk_007.mp3")));
        assert!(paths.srt_path().starts_with("/tmp/out"));
    }
}
