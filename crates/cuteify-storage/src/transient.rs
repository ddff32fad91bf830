//! Transient upload lifecycle.
//!
//! A [`PendingUpload`] is created when the first byte of an accepted file part
//! is about to be written, and becomes a [`TransientUpload`] once the part has
//! been fully written and synced. Both own the file on disk: whichever one is
//! alive when the request ends removes it, exactly once.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{CleanupError, StorageError, StorageResult};
use crate::keys;

/// A fully received upload in the transient directory.
///
/// Call [`TransientUpload::release`] when processing is finished. If the value
/// is dropped without being released (early return, panic), the file is removed
/// synchronously in `Drop`.
#[derive(Debug)]
pub struct TransientUpload {
    path: PathBuf,
    file_name: String,
    original_filename: String,
    content_type: String,
    size: u64,
    released: bool,
}

impl TransientUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Generated name inside the transient directory
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Generated name without its extension; variant names derive from it
    pub fn stem(&self) -> &str {
        keys::file_stem(&self.file_name)
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Remove the file. Failures are logged and swallowed.
    pub async fn release(mut self) {
        self.released = true;
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Transient upload removed");
            }
            Err(source) => {
                let err = CleanupError {
                    path: self.path.clone(),
                    source,
                };
                tracing::warn!(error = %err, "Failed to delete transient upload");
            }
        }
    }
}

impl Drop for TransientUpload {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Unreleased transient upload removed");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                let err = CleanupError {
                    path: self.path.clone(),
                    source,
                };
                tracing::warn!(error = %err, "Failed to delete unreleased transient upload");
            }
        }
    }
}

/// An upload being streamed into the transient directory.
#[derive(Debug)]
pub struct PendingUpload {
    file: fs::File,
    upload: TransientUpload,
}

impl PendingUpload {
    pub(crate) async fn create(
        path: PathBuf,
        file_name: String,
        original_filename: &str,
        content_type: &str,
    ) -> StorageResult<Self> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        Ok(Self {
            file,
            upload: TransientUpload {
                path,
                file_name,
                original_filename: original_filename.to_string(),
                content_type: content_type.to_string(),
                size: 0,
                released: false,
            },
        })
    }

    pub fn path(&self) -> &Path {
        self.upload.path()
    }

    pub fn bytes_written(&self) -> u64 {
        self.upload.size
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> StorageResult<()> {
        self.file.write_all(chunk).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                self.upload.path.display(),
                e
            ))
        })?;
        self.upload.size += chunk.len() as u64;
        Ok(())
    }

    /// Flush and sync the file; the upload is durable once this returns.
    pub async fn finish(self) -> StorageResult<TransientUpload> {
        let PendingUpload { mut file, upload } = self;

        file.flush().await?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to sync file {}: {}",
                upload.path.display(),
                e
            ))
        })?;
        drop(file);

        tracing::info!(
            path = %upload.path.display(),
            original_filename = %upload.original_filename,
            size_bytes = upload.size,
            "Transient upload stored"
        );

        Ok(upload)
    }

    /// Discard a partially written upload.
    pub async fn abort(self) {
        let PendingUpload { file, upload } = self;
        drop(file);
        upload.release().await;
    }
}
