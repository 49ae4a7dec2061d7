use crate::domain::ports::ArtifactStore;
use crate::utils::error::{PredictorError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    base_path: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl ArtifactStore for LocalArtifactStore {
    async fn load(&self, name: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(name);
        tracing::debug!("Reading artifact from {}", full_path.display());

        match tokio::fs::read(&full_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PredictorError::ArtifactNotFound {
                    name: full_path.display().to_string(),
                })
            }
            Err(e) => Err(PredictorError::IoError(e)),
        }
    }

    fn describe(&self) -> String {
        format!("local:{}", self.base_path.display())
    }
}

/// 記憶體內的 artifact，供一次性工具與測試使用
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    artifacts: HashMap<String, Vec<u8>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.artifacts.insert(name.into(), data.into());
    }
}

impl ArtifactStore for MemoryArtifactStore {
    async fn load(&self, name: &str) -> Result<Vec<u8>> {
        self.artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| PredictorError::ArtifactNotFound {
                name: name.to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("memory:{} artifacts", self.artifacts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_store_reads_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("model.json"), b"{}").unwrap();

        let store = LocalArtifactStore::new(dir.path());
        let data = store.load("model.json").await.unwrap();
        assert_eq!(data, b"{}");
    }

    #[tokio::test]
    async fn test_local_store_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = LocalArtifactStore::new(dir.path());

        let err = store.load("le_state.json").await.unwrap_err();
        assert!(matches!(err, PredictorError::ArtifactNotFound { .. }));
        assert!(err.to_string().contains("le_state.json"));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryArtifactStore::new().with_artifact("a.json", "[]");
        assert_eq!(store.load("a.json").await.unwrap(), b"[]");
        assert!(store.load("b.json").await.is_err());
        assert_eq!(store.describe(), "memory:1 artifacts");
    }
}
