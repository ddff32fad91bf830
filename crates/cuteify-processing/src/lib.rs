//! Cuteify Processing Library
//!
//! Everything between an accepted multipart part and the list of variant paths:
//! upload validation, the fixed variant set, per-variant image transforms, and
//! the concurrent fan-out that runs them.
//!
//! # Example
//!
//! ```no_run
//! use cuteify_core::Config;
//! use cuteify_processing::UploadPipeline;
//!
//! # use bytes::Bytes;
//! # use cuteify_processing::PipelineError;
//! # use futures::Stream;
//! # async fn demo(
//! #     chunks: impl Stream<Item = Result<Bytes, PipelineError>>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = UploadPipeline::from_config(&Config::default()).await?;
//! let paths = pipeline.run("cat.png", "image/png", chunks).await?;
//! assert_eq!(paths.len(), 4);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fanout;
pub mod image;
pub mod pipeline;
pub mod validator;
pub mod variants;

// Re-export commonly used types
pub use self::image::{ImageOrientation, ImageResize, ImageTransformer};
pub use error::{PipelineError, TransformError};
pub use fanout::{
    FanOutCoordinator, FanOutOutcome, JpegVariantRenderer, TransformResult, VariantRenderer,
};
pub use pipeline::UploadPipeline;
pub use validator::{MediaValidator, ValidationError};
pub use variants::{Rotation, TransformDescriptor, CUTE_VARIANTS, VARIANT_SIZE};
