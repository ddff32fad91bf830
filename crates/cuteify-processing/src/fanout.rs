//! Fan-out of one transient upload into its variants.
//!
//! Every descriptor gets its own tokio task. The coordinator joins all of them,
//! failed or not, before returning: a failing task never cancels its siblings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cuteify_core::constants::PROCESSED_ROUTE;
use cuteify_storage::{keys, LocalStorage, TransientUpload};
use futures::future::join_all;

use crate::error::TransformError;
use crate::image::ImageTransformer;
use crate::variants::{TransformDescriptor, CUTE_VARIANTS};

/// Renders one variant from the source image bytes.
///
/// Called on the blocking thread pool.
pub trait VariantRenderer: Send + Sync + 'static {
    fn render(
        &self,
        source: &[u8],
        descriptor: &TransformDescriptor,
    ) -> Result<Vec<u8>, TransformError>;
}

/// Cover-fit, rotate, JPEG encode
#[derive(Debug, Clone, Copy)]
pub struct JpegVariantRenderer {
    quality: u8,
}

impl JpegVariantRenderer {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }
}

impl VariantRenderer for JpegVariantRenderer {
    fn render(
        &self,
        source: &[u8],
        descriptor: &TransformDescriptor,
    ) -> Result<Vec<u8>, TransformError> {
        ImageTransformer::render_variant(source, descriptor, self.quality)
    }
}

/// Result of one transform task
#[derive(Debug)]
pub struct TransformResult {
    pub descriptor: &'static TransformDescriptor,
    /// Variant file name, e.g. `{stem}_cute2.jpg`
    pub file_name: String,
    /// Path under the static route, e.g. `/processed/{stem}_cute2.jpg`
    pub public_path: String,
    /// Filesystem path of the written variant, or the failure
    pub outcome: Result<PathBuf, TransformError>,
}

impl TransformResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Results of a full fan-out, in descriptor order
#[derive(Debug)]
pub struct FanOutOutcome {
    results: Vec<TransformResult>,
}

impl FanOutOutcome {
    pub fn results(&self) -> &[TransformResult] {
        &self.results
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(TransformResult::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &TransformResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// All-or-nothing: every public path in descriptor order, or the first
    /// failure in descriptor order.
    pub fn into_public_paths(self) -> Result<Vec<String>, TransformError> {
        self.results
            .into_iter()
            .map(|result| result.outcome.map(|_| result.public_path))
            .collect()
    }
}

/// Runs the transform tasks for one upload
#[derive(Clone)]
pub struct FanOutCoordinator {
    storage: LocalStorage,
    renderer: Arc<dyn VariantRenderer>,
    descriptors: &'static [TransformDescriptor],
    timeout: Option<Duration>,
}

impl FanOutCoordinator {
    pub fn new(storage: LocalStorage, renderer: Arc<dyn VariantRenderer>) -> Self {
        Self {
            storage,
            renderer,
            descriptors: &CUTE_VARIANTS,
            timeout: None,
        }
    }

    pub fn with_descriptors(mut self, descriptors: &'static [TransformDescriptor]) -> Self {
        self.descriptors = descriptors;
        self
    }

    /// Bound the read and render of each task; a task exceeding it is reported
    /// as timed out. The variant write is never cut short.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn descriptors(&self) -> &'static [TransformDescriptor] {
        self.descriptors
    }

    /// Launch one task per descriptor against `upload` and wait for all of them.
    pub async fn run(&self, upload: &TransientUpload) -> FanOutOutcome {
        let start = std::time::Instant::now();

        let file_names: Vec<String> = self
            .descriptors
            .iter()
            .map(|d| keys::output_file_name(upload.file_name(), d.suffix))
            .collect();

        let handles: Vec<_> = self
            .descriptors
            .iter()
            .zip(file_names.iter().cloned())
            .map(|(descriptor, file_name)| {
                tokio::spawn(run_transform_task(
                    self.storage.clone(),
                    self.renderer.clone(),
                    upload.path().to_path_buf(),
                    descriptor,
                    file_name,
                    self.timeout,
                ))
            })
            .collect();

        let joined = join_all(handles).await;

        let results: Vec<TransformResult> = self
            .descriptors
            .iter()
            .zip(file_names)
            .zip(joined)
            .map(|((descriptor, file_name), joined)| {
                let outcome = joined.unwrap_or_else(|e| Err(TransformError::Join(e.to_string())));
                if let Err(ref e) = outcome {
                    tracing::error!(
                        error = %e,
                        suffix = descriptor.suffix,
                        rotation = descriptor.rotation.degrees(),
                        input = %upload.file_name(),
                        "Transform task failed"
                    );
                }
                TransformResult {
                    descriptor,
                    public_path: keys::public_path(PROCESSED_ROUTE, &file_name),
                    file_name,
                    outcome,
                }
            })
            .collect();

        let outcome = FanOutOutcome { results };
        tracing::info!(
            input = %upload.file_name(),
            tasks = outcome.results.len(),
            failed = outcome.failures().count(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fan-out complete"
        );
        outcome
    }
}

/// One transform task: read the input, render on the blocking pool, write the variant.
///
/// `timeout` covers the read and render only. Once rendering finishes the write
/// runs to completion, so a timed-out task leaves no partial file behind.
async fn run_transform_task(
    storage: LocalStorage,
    renderer: Arc<dyn VariantRenderer>,
    input: PathBuf,
    descriptor: &'static TransformDescriptor,
    file_name: String,
    timeout: Option<Duration>,
) -> Result<PathBuf, TransformError> {
    let render = async move {
        let source = tokio::fs::read(&input)
            .await
            .map_err(TransformError::Read)?;

        tokio::task::spawn_blocking(move || renderer.render(&source, descriptor))
            .await
            .map_err(|e| TransformError::Join(e.to_string()))?
    };

    let rendered = match timeout {
        Some(limit) => tokio::time::timeout(limit, render)
            .await
            .map_err(|_| TransformError::TimedOut(limit))??,
        None => render.await?,
    };

    storage
        .write_variant(&file_name, &rendered)
        .await
        .map_err(TransformError::Write)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::Rotation;
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
    use std::collections::HashSet;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(80, 60, Rgb([40, 80, 120])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    async fn setup() -> (TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("uploads"), dir.path().join("processed"))
            .await
            .unwrap();
        (dir, storage)
    }

    async fn store(storage: &LocalStorage, data: &[u8]) -> TransientUpload {
        let mut pending = storage.begin_upload("cat.png", "image/png").await.unwrap();
        pending.write_chunk(data).await.unwrap();
        pending.finish().await.unwrap()
    }

    /// Fails for one rotation, counts every call
    struct FailingRenderer {
        fail_on: Rotation,
        calls: AtomicUsize,
    }

    impl VariantRenderer for FailingRenderer {
        fn render(
            &self,
            source: &[u8],
            descriptor: &TransformDescriptor,
        ) -> Result<Vec<u8>, TransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if descriptor.rotation == self.fail_on {
                return Err(TransformError::Render("injected failure".to_string()));
            }
            JpegVariantRenderer::new(80).render(source, descriptor)
        }
    }

    struct SlowRenderer;

    impl VariantRenderer for SlowRenderer {
        fn render(&self, _: &[u8], _: &TransformDescriptor) -> Result<Vec<u8>, TransformError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(vec![0xFF, 0xD8])
        }
    }

    /// Renders within the deadline but hands back a large buffer to write
    struct LargeOutputRenderer;

    const LARGE_OUTPUT_LEN: usize = 8 * 1024 * 1024;

    impl VariantRenderer for LargeOutputRenderer {
        fn render(&self, _: &[u8], _: &TransformDescriptor) -> Result<Vec<u8>, TransformError> {
            std::thread::sleep(Duration::from_millis(150));
            Ok(vec![0xAB; LARGE_OUTPUT_LEN])
        }
    }

    struct PanickingRenderer;

    impl VariantRenderer for PanickingRenderer {
        fn render(&self, _: &[u8], d: &TransformDescriptor) -> Result<Vec<u8>, TransformError> {
            if d.rotation == Rotation::Deg270 {
                panic!("renderer bug");
            }
            Ok(vec![0xFF, 0xD8])
        }
    }

    #[tokio::test]
    async fn test_fan_out_produces_one_result_per_descriptor() {
        let (_dir, storage) = setup().await;
        let upload = store(&storage, &png_bytes()).await;
        let coordinator =
            FanOutCoordinator::new(storage.clone(), Arc::new(JpegVariantRenderer::new(80)));

        let outcome = coordinator.run(&upload).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.results().len(), 4);

        let rotations: Vec<u16> = outcome
            .results()
            .iter()
            .map(|r| r.descriptor.rotation.degrees())
            .collect();
        assert_eq!(rotations, vec![0, 90, 180, 270]);

        let stem = upload.stem().to_string();
        for (i, result) in outcome.results().iter().enumerate() {
            assert_eq!(result.file_name, format!("{}_cute{}.jpg", stem, i + 1));
            let path = result.outcome.as_ref().unwrap();
            assert!(path.starts_with(storage.processed_dir()));
            let decoded = image::open(path).unwrap();
            assert_eq!(decoded.dimensions(), (300, 300));
        }

        let paths = outcome.into_public_paths().unwrap();
        assert_eq!(
            paths,
            (1..=4)
                .map(|i| format!("/processed/{}_cute{}.jpg", stem, i))
                .collect::<Vec<_>>()
        );

        // Input is read-only to the tasks
        assert_eq!(std::fs::read(upload.path()).unwrap(), png_bytes());
        upload.release().await;
    }

    #[tokio::test]
    async fn test_single_failure_fails_whole_outcome_without_cancelling_siblings() {
        let (_dir, storage) = setup().await;
        let upload = store(&storage, &png_bytes()).await;
        let renderer = Arc::new(FailingRenderer {
            fail_on: Rotation::Deg180,
            calls: AtomicUsize::new(0),
        });
        let coordinator = FanOutCoordinator::new(storage.clone(), renderer.clone());

        let outcome = coordinator.run(&upload).await;
        assert!(!outcome.is_success());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.failures().count(), 1);

        // Siblings ran to completion
        let succeeded: Vec<&TransformResult> = outcome
            .results()
            .iter()
            .filter(|r| r.is_success())
            .collect();
        assert_eq!(succeeded.len(), 3);
        for result in succeeded {
            assert!(result.outcome.as_ref().unwrap().exists());
        }

        assert!(matches!(
            outcome.into_public_paths(),
            Err(TransformError::Render(_))
        ));
        upload.release().await;
    }

    #[tokio::test]
    async fn test_corrupted_input_fails_every_task() {
        let (_dir, storage) = setup().await;
        let upload = store(&storage, b"\x89PNG\r\n\x1a\nnot really").await;
        let coordinator =
            FanOutCoordinator::new(storage.clone(), Arc::new(JpegVariantRenderer::new(80)));

        let outcome = coordinator.run(&upload).await;
        assert_eq!(outcome.failures().count(), 4);
        assert!(matches!(
            outcome.into_public_paths(),
            Err(TransformError::Decode(_))
        ));
        upload.release().await;
    }

    #[tokio::test]
    async fn test_missing_input_reports_read_error() {
        let (_dir, storage) = setup().await;
        let upload = store(&storage, &png_bytes()).await;
        std::fs::remove_file(upload.path()).unwrap();

        let coordinator =
            FanOutCoordinator::new(storage.clone(), Arc::new(JpegVariantRenderer::new(80)));
        let outcome = coordinator.run(&upload).await;
        assert!(outcome
            .results()
            .iter()
            .all(|r| matches!(r.outcome, Err(TransformError::Read(_)))));
        upload.release().await;
    }

    #[tokio::test]
    async fn test_timeout_is_reported_per_task() {
        let (_dir, storage) = setup().await;
        let upload = store(&storage, &png_bytes()).await;
        let coordinator = FanOutCoordinator::new(storage.clone(), Arc::new(SlowRenderer))
            .with_timeout(Some(Duration::from_millis(50)));

        let outcome = coordinator.run(&upload).await;
        assert!(outcome
            .results()
            .iter()
            .all(|r| matches!(r.outcome, Err(TransformError::TimedOut(_)))));
        upload.release().await;

        // Abandoned renders finish in the background but never write
        tokio::time::sleep(Duration::from_millis(600)).await;
        let written = std::fs::read_dir(storage.processed_dir()).unwrap().count();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn test_timeout_does_not_cut_short_variant_write() {
        let (_dir, storage) = setup().await;
        let upload = store(&storage, &png_bytes()).await;
        let coordinator = FanOutCoordinator::new(storage.clone(), Arc::new(LargeOutputRenderer))
            .with_timeout(Some(Duration::from_millis(400)));

        let outcome = coordinator.run(&upload).await;
        assert!(outcome.is_success());
        for result in outcome.results() {
            let path = result.outcome.as_ref().unwrap();
            let written = std::fs::metadata(path).unwrap().len();
            assert_eq!(written as usize, LARGE_OUTPUT_LEN);
        }
        upload.release().await;
    }

    #[tokio::test]
    async fn test_panicking_task_becomes_join_error() {
        let (_dir, storage) = setup().await;
        let upload = store(&storage, &png_bytes()).await;
        let coordinator = FanOutCoordinator::new(storage.clone(), Arc::new(PanickingRenderer));

        let outcome = coordinator.run(&upload).await;
        let failed: Vec<&TransformResult> = outcome.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].descriptor.rotation, Rotation::Deg270);
        assert!(matches!(failed[0].outcome, Err(TransformError::Join(_))));
        upload.release().await;
    }

    #[tokio::test]
    async fn test_concurrent_uploads_do_not_collide() {
        let (_dir, storage) = setup().await;
        let first = store(&storage, &png_bytes()).await;
        let second = store(&storage, &png_bytes()).await;
        let coordinator =
            FanOutCoordinator::new(storage.clone(), Arc::new(JpegVariantRenderer::new(80)));

        let (a, b) = tokio::join!(coordinator.run(&first), coordinator.run(&second));
        let a = a.into_public_paths().unwrap();
        let b = b.into_public_paths().unwrap();

        let all: HashSet<&String> = a.iter().chain(b.iter()).collect();
        assert_eq!(all.len(), 8);
        assert!(a.iter().all(|p| p.contains(first.stem())));
        assert!(b.iter().all(|p| p.contains(second.stem())));

        first.release().await;
        second.release().await;
    }

    #[tokio::test]
    async fn test_custom_descriptor_set() {
        static ONLY_FLIPPED: [TransformDescriptor; 1] = [TransformDescriptor {
            suffix: "_flipped",
            width: 32,
            height: 32,
            rotation: Rotation::Deg180,
        }];

        let (_dir, storage) = setup().await;
        let upload = store(&storage, &png_bytes()).await;
        let coordinator =
            FanOutCoordinator::new(storage.clone(), Arc::new(JpegVariantRenderer::new(80)))
                .with_descriptors(&ONLY_FLIPPED);
        assert_eq!(coordinator.descriptors().len(), 1);

        let paths = coordinator.run(&upload).await.into_public_paths().unwrap();
        let expected = format!("/processed/{}_flipped.jpg", upload.stem());
        assert_eq!(paths, vec![expected]);
        upload.release().await;
    }

    #[tokio::test]
    async fn test_rerun_overwrites_outputs() {
        let (_dir, storage) = setup().await;
        let upload = store(&storage, &png_bytes()).await;
        let coordinator =
            FanOutCoordinator::new(storage.clone(), Arc::new(JpegVariantRenderer::new(80)));

        let first = coordinator.run(&upload).await.into_public_paths().unwrap();
        let second = coordinator.run(&upload).await.into_public_paths().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            std::fs::read_dir(storage.processed_dir()).unwrap().count(),
            4
        );
        upload.release().await;
    }
}
