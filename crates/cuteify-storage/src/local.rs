use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{StorageError, StorageResult};
use crate::keys;
use crate::transient::PendingUpload;

/// Local filesystem layout: one directory for transient uploads, one for
/// generated variants.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    upload_dir: PathBuf,
    processed_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating both directories if absent
    ///
    /// # Arguments
    /// * `upload_dir` - Directory for transient uploads (e.g., "uploads")
    /// * `processed_dir` - Directory for generated variants (e.g., "processed")
    pub async fn new(
        upload_dir: impl Into<PathBuf>,
        processed_dir: impl Into<PathBuf>,
    ) -> StorageResult<Self> {
        let upload_dir = upload_dir.into();
        let processed_dir = processed_dir.into();

        for dir in [&upload_dir, &processed_dir] {
            fs::create_dir_all(dir).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        tracing::info!(
            upload_dir = %upload_dir.display(),
            processed_dir = %processed_dir.display(),
            "Local storage directories ready"
        );

        Ok(LocalStorage {
            upload_dir,
            processed_dir,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn processed_dir(&self) -> &Path {
        &self.processed_dir
    }

    fn join_checked(dir: &Path, file_name: &str) -> StorageResult<PathBuf> {
        if !keys::is_safe_file_name(file_name) {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }
        Ok(dir.join(file_name))
    }

    /// Start streaming an accepted upload into the transient directory under a
    /// freshly generated name.
    pub async fn begin_upload(
        &self,
        original_filename: &str,
        content_type: &str,
    ) -> StorageResult<PendingUpload> {
        let file_name = keys::transient_file_name(original_filename);
        let path = Self::join_checked(&self.upload_dir, &file_name)?;
        PendingUpload::create(path, file_name, original_filename, content_type).await
    }

    /// Filesystem path of a variant in the processed directory
    pub fn variant_path(&self, file_name: &str) -> StorageResult<PathBuf> {
        Self::join_checked(&self.processed_dir, file_name)
    }

    /// Write (or overwrite) a variant and return its filesystem path
    pub async fn write_variant(&self, file_name: &str, data: &[u8]) -> StorageResult<PathBuf> {
        let path = self.variant_path(file_name)?;
        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::debug!(
            path = %path.display(),
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Variant written"
        );

        Ok(path)
    }
}
