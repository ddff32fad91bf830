//! Upload pipeline: validate, persist, fan out, clean up.

use std::sync::Arc;

use bytes::Bytes;
use cuteify_core::Config;
use cuteify_storage::{LocalStorage, TransientUpload};
use futures::{Stream, StreamExt};

use crate::error::PipelineError;
use crate::fanout::{FanOutCoordinator, JpegVariantRenderer, VariantRenderer};
use crate::validator::MediaValidator;

#[derive(Clone)]
pub struct UploadPipeline {
    validator: MediaValidator,
    storage: LocalStorage,
    coordinator: FanOutCoordinator,
}

impl UploadPipeline {
    pub fn new(
        validator: MediaValidator,
        storage: LocalStorage,
        renderer: Arc<dyn VariantRenderer>,
    ) -> Self {
        let coordinator = FanOutCoordinator::new(storage.clone(), renderer);
        Self {
            validator,
            storage,
            coordinator,
        }
    }

    /// Build the pipeline from configuration, creating the storage directories.
    pub async fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let storage = LocalStorage::new(&config.upload_dir, &config.processed_dir).await?;
        let validator = MediaValidator::images(config.max_file_size_bytes);
        let renderer = Arc::new(JpegVariantRenderer::new(config.jpeg_quality));

        Ok(Self::new(validator, storage, renderer).with_timeout(config.transform_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
        self.coordinator = self.coordinator.with_timeout(timeout);
        self
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// Validate the part headers, then stream its bytes into transient storage.
    ///
    /// Nothing is created on disk unless the headers pass. A stream error or an
    /// oversized body removes the partial file before returning.
    pub async fn ingest<S>(
        &self,
        filename: &str,
        content_type: &str,
        chunks: S,
    ) -> Result<TransientUpload, PipelineError>
    where
        S: Stream<Item = Result<Bytes, PipelineError>>,
    {
        self.validator.validate_headers(filename, content_type)?;

        let mut pending = self.storage.begin_upload(filename, content_type).await?;
        let mut chunks = std::pin::pin!(chunks);

        while let Some(chunk) = chunks.next().await {
            let written = match chunk {
                Ok(data) => {
                    let size = pending.bytes_written() as usize + data.len();
                    if let Err(e) = self.validator.validate_size_limit(size) {
                        pending.abort().await;
                        return Err(e.into());
                    }
                    pending.write_chunk(&data).await
                }
                Err(e) => {
                    pending.abort().await;
                    return Err(e);
                }
            };

            if let Err(e) = written {
                pending.abort().await;
                return Err(e.into());
            }
        }

        let total = pending.bytes_written() as usize;
        if let Err(e) = self.validator.validate_file_size(total) {
            pending.abort().await;
            return Err(e.into());
        }

        Ok(pending.finish().await?)
    }

    /// Run every transform against `upload`, release it, and return the
    /// public paths of the variants in response order.
    pub async fn process(&self, upload: TransientUpload) -> Result<Vec<String>, PipelineError> {
        let outcome = self.coordinator.run(&upload).await;
        upload.release().await;

        Ok(outcome.into_public_paths()?)
    }

    /// Ingest then process.
    pub async fn run<S>(
        &self,
        filename: &str,
        content_type: &str,
        chunks: S,
    ) -> Result<Vec<String>, PipelineError>
    where
        S: Stream<Item = Result<Bytes, PipelineError>>,
    {
        let upload = self.ingest(filename, content_type, chunks).await?;
        self.process(upload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::validator::ValidationError;
    use crate::variants::{Rotation, TransformDescriptor};
    use futures::stream;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([200, 120, 160])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn chunked(data: Vec<u8>, size: usize) -> impl Stream<Item = Result<Bytes, PipelineError>> {
        let parts: Vec<Result<Bytes, PipelineError>> = data
            .chunks(size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(parts)
    }

    async fn pipeline_with(
        max: usize,
        renderer: Arc<dyn VariantRenderer>,
    ) -> (TempDir, UploadPipeline) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("uploads"), dir.path().join("processed"))
            .await
            .unwrap();
        let pipeline = UploadPipeline::new(MediaValidator::images(max), storage, renderer);
        (dir, pipeline)
    }

    async fn pipeline() -> (TempDir, UploadPipeline) {
        pipeline_with(5 * 1024 * 1024, Arc::new(JpegVariantRenderer::new(80))).await
    }

    fn entries(path: &std::path::Path) -> usize {
        std::fs::read_dir(path).unwrap().count()
    }

    struct FailOn180;

    impl VariantRenderer for FailOn180 {
        fn render(
            &self,
            source: &[u8],
            descriptor: &TransformDescriptor,
        ) -> Result<Vec<u8>, TransformError> {
            if descriptor.rotation == Rotation::Deg180 {
                return Err(TransformError::Render("injected".to_string()));
            }
            JpegVariantRenderer::new(80).render(source, descriptor)
        }
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let (_dir, pipeline) = pipeline().await;

        for (name, ct) in [
            ("notes.txt", "text/plain"),
            ("cat.gif", "image/gif"),
            ("cat.png", "application/octet-stream"),
            ("cat.txt", "image/png"),
        ] {
            let result = pipeline.run(name, ct, chunked(png_bytes(), 1024)).await;
            assert!(
                matches!(result, Err(PipelineError::Validation(_))),
                "{name} {ct}"
            );
        }

        assert_eq!(entries(pipeline.storage().upload_dir()), 0);
        assert_eq!(entries(pipeline.storage().processed_dir()), 0);
    }

    #[tokio::test]
    async fn test_success_returns_four_paths_and_removes_input() {
        let (_dir, pipeline) = pipeline().await;

        let upload = pipeline
            .ingest("kitten.png", "image/png", chunked(png_bytes(), 100))
            .await
            .unwrap();
        let stem = upload.stem().to_string();
        assert_eq!(std::fs::read(upload.path()).unwrap(), png_bytes());

        let paths = pipeline.process(upload).await.unwrap();
        assert_eq!(
            paths,
            (1..=4)
                .map(|i| format!("/processed/{}_cute{}.jpg", stem, i))
                .collect::<Vec<_>>()
        );
        assert_eq!(entries(pipeline.storage().upload_dir()), 0);
        assert_eq!(entries(pipeline.storage().processed_dir()), 4);
    }

    #[tokio::test]
    async fn test_transform_failure_still_removes_input() {
        let (_dir, pipeline) = pipeline().await;

        let corrupt = b"\x89PNG\r\n\x1a\ngarbage".to_vec();
        let result = pipeline
            .run("broken.png", "image/png", chunked(corrupt, 4))
            .await;
        assert!(matches!(result, Err(PipelineError::Transform(_))));
        assert_eq!(entries(pipeline.storage().upload_dir()), 0);
    }

    #[tokio::test]
    async fn test_single_injected_failure_fails_request() {
        let (_dir, pipeline) = pipeline_with(5 * 1024 * 1024, Arc::new(FailOn180)).await;

        let result = pipeline
            .run("cat.png", "image/png", chunked(png_bytes(), 512))
            .await;
        assert!(matches!(
            result,
            Err(PipelineError::Transform(TransformError::Render(_)))
        ));
        assert_eq!(entries(pipeline.storage().upload_dir()), 0);
    }

    #[tokio::test]
    async fn test_oversized_stream_is_aborted() {
        let (_dir, pipeline) = pipeline_with(1000, Arc::new(JpegVariantRenderer::new(80))).await;

        let result = pipeline
            .ingest("big.png", "image/png", chunked(vec![0u8; 1500], 256))
            .await;
        assert!(matches!(
            result,
            Err(PipelineError::Validation(ValidationError::FileTooLarge { .. }))
        ));
        assert_eq!(entries(pipeline.storage().upload_dir()), 0);

        // Exactly at the limit is accepted
        let upload = pipeline
            .ingest("edge.png", "image/png", chunked(vec![1u8; 1000], 256))
            .await
            .unwrap();
        assert_eq!(upload.size(), 1000);
        upload.release().await;
    }

    #[tokio::test]
    async fn test_stream_error_removes_partial_file() {
        let (_dir, pipeline) = pipeline().await;
        let parts: Vec<Result<Bytes, PipelineError>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(PipelineError::Stream("connection reset".to_string())),
        ];

        let result = pipeline
            .ingest("cat.png", "image/png", stream::iter(parts))
            .await;
        assert!(matches!(result, Err(PipelineError::Stream(_))));
        assert_eq!(entries(pipeline.storage().upload_dir()), 0);
    }

    #[tokio::test]
    async fn test_empty_file_is_rejected() {
        let (_dir, pipeline) = pipeline().await;

        let empty: Vec<Result<Bytes, PipelineError>> = Vec::new();
        let result = pipeline
            .ingest("empty.jpg", "image/jpeg", stream::iter(empty))
            .await;
        assert!(matches!(
            result,
            Err(PipelineError::Validation(ValidationError::EmptyFile))
        ));
        assert_eq!(entries(pipeline.storage().upload_dir()), 0);
    }

    #[tokio::test]
    async fn test_concurrent_runs_are_independent() {
        let (_dir, pipeline) = pipeline().await;

        let runs = (0..4).map(|_| pipeline.run("same.png", "image/png", chunked(png_bytes(), 700)));
        let results = futures::future::join_all(runs).await;

        let mut all = std::collections::HashSet::new();
        for result in results {
            for path in result.unwrap() {
                assert!(all.insert(path));
            }
        }
        assert_eq!(all.len(), 16);
        assert_eq!(entries(pipeline.storage().upload_dir()), 0);
        assert_eq!(entries(pipeline.storage().processed_dir()), 16);
    }
}
