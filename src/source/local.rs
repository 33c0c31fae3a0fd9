use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{DataSource, SourceId};
use crate::error::PipelineError;

/// A dataset on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for LocalFile {
    fn id(&self) -> SourceId {
        SourceId::File {
            path: self.path.display().to_string(),
        }
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn read_bytes(&self) -> Result<Bytes, PipelineError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| PipelineError::source_unavailable(self.id(), e))?;
        debug!(bytes = bytes.len(), "Read local dataset");
        Ok(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_existing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Diet_type\nvegan\n").unwrap();

        let source = LocalFile::new(file.path());
        let bytes = source.read_bytes().await.unwrap();
        assert_eq!(&bytes[..], b"Diet_type\nvegan\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalFile::new(dir.path().join("All_Diets.csv"));
        let err = source.read_bytes().await.unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    }
}
