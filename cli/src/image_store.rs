use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ramekin_import::{ImageUploader, UploadError};
use uuid::Uuid;

/// Stores relayed images as files named by a fresh photo ID.
pub struct DirectoryImageStore {
    dir: PathBuf,
}

impl DirectoryImageStore {
    /// Create the directory if needed.
    pub async fn create(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(id.to_string())
    }
}

#[async_trait]
impl ImageUploader for DirectoryImageStore {
    async fn upload_image(&self, data: Vec<u8>) -> Result<Uuid, UploadError> {
        let id = Uuid::new_v4();
        let path = self.path_for(id);
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| UploadError::new(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "stored image");
        Ok(id)
    }
}
