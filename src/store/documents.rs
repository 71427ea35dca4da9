use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::leave::error::LeaveError;
use crate::model::document::{DocumentMeta, StorageRef};

/// Byte storage for supporting documents.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Fails with `UploadFailed`.
    async fn put(&self, bytes: &[u8], meta: &DocumentMeta) -> Result<StorageRef, LeaveError>;

    /// Fails with `DocumentUnavailable`.
    async fn get(&self, storage_ref: &StorageRef) -> Result<Vec<u8>, LeaveError>;

    /// Removes bytes no draft or request refers to anymore. Missing bytes are not an error.
    async fn delete(&self, storage_ref: &StorageRef) -> Result<(), LeaveError>;
}

/// Stores each document as one file under a root directory.
pub struct LocalDocumentStorage {
    root: PathBuf,
}

impl LocalDocumentStorage {
    pub async fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Keep only a short alphanumeric extension from the client name.
    fn extension_of(name: &str) -> Option<String> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        (ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())).then_some(ext)
    }

    fn path_for(&self, storage_ref: &StorageRef) -> Option<PathBuf> {
        let name = storage_ref.0.as_str();
        let safe = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !name.starts_with('.');
        safe.then(|| self.root.join(name))
    }
}

#[async_trait]
impl DocumentStorage for LocalDocumentStorage {
    async fn put(&self, bytes: &[u8], meta: &DocumentMeta) -> Result<StorageRef, LeaveError> {
        let id = Uuid::new_v4().to_string();
        let name = match Self::extension_of(&meta.original_name) {
            Some(ext) => format!("{id}.{ext}"),
            None => id,
        };
        let storage_ref = StorageRef(name);
        let path = self.root.join(&storage_ref.0);

        fs::write(&path, bytes).await.map_err(|e| {
            error!(error = %e, path = %path.display(), "Failed to write document");
            LeaveError::UploadFailed(format!("could not store '{}'", meta.original_name))
        })?;

        debug!(storage_ref = %storage_ref, size = bytes.len(), "Document stored");
        Ok(storage_ref)
    }

    async fn get(&self, storage_ref: &StorageRef) -> Result<Vec<u8>, LeaveError> {
        let path = self
            .path_for(storage_ref)
            .ok_or_else(|| LeaveError::DocumentUnavailable(format!("invalid storage ref '{storage_ref}'")))?;

        fs::read(&path).await.map_err(|e| {
            error!(error = %e, path = %path.display(), "Failed to read document");
            LeaveError::DocumentUnavailable(format!("document '{storage_ref}' is not readable"))
        })
    }

    async fn delete(&self, storage_ref: &StorageRef) -> Result<(), LeaveError> {
        let path = self
            .path_for(storage_ref)
            .ok_or_else(|| LeaveError::DocumentUnavailable(format!("invalid storage ref '{storage_ref}'")))?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(storage_ref = %storage_ref, "Document deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to delete document");
                Err(LeaveError::DocumentUnavailable(format!(
                    "document '{storage_ref}' could not be deleted"
                )))
            }
        }
    }
}
