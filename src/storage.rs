//! Upload storage
//!
//! Uploaded decks are persisted on local disk under a generated identifier.
//! Identifiers are UUIDs, which also keeps lookups from escaping the
//! upload directory.

use crate::errors::AppError;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open the store, creating the upload directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Persist uploaded PDF bytes under a fresh identifier.
    pub async fn save(&self, content: &[u8]) -> Result<Uuid, AppError> {
        let file_id = Uuid::new_v4();
        let path = self.path_of(file_id);
        tokio::fs::write(&path, content).await?;
        debug!(file_id = %file_id, bytes = content.len(), "Upload persisted");
        Ok(file_id)
    }

    /// Resolve an upload id to its file path, or NotFound.
    pub async fn resolve(&self, file_id: &str) -> Result<PathBuf, AppError> {
        let parsed =
            Uuid::parse_str(file_id).map_err(|_| crate::not_found!("pitch_deck", file_id))?;

        let path = self.path_of(parsed);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(crate::not_found!("pitch_deck", file_id));
        }
        Ok(path)
    }

    fn path_of(&self, file_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.pdf", file_id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_resolve() {
        let dir = std::env::temp_dir().join(format!("deckcheck-test-{}", Uuid::new_v4()));
        let store = UploadStore::open(&dir).await.unwrap();

        let file_id = store.save(b"%PDF-1.4 test").await.unwrap();
        let path = store.resolve(&file_id.to_string()).await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4 test");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let dir = std::env::temp_dir().join(format!("deckcheck-test-{}", Uuid::new_v4()));
        let store = UploadStore::open(&dir).await.unwrap();

        let err = store.resolve(&Uuid::new_v4().to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        // Malformed ids are treated the same way, not as path lookups
        let err = store.resolve("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
