//! Cuteify Storage Library
//!
//! Local filesystem layout for the upload pipeline: the transient upload
//! directory, the processed output directory, the naming scheme shared by both,
//! and the guard that removes a transient upload once the request is done.
//!
//! # Naming
//!
//! - Transient upload: `{token}{original_extension}` where `token` is a random
//!   UUID in simple form.
//! - Variant: `{transient_stem}{suffix}.jpg`.
//!
//! Names never contain path separators or `..`; see the `keys` module.

pub mod error;
pub mod keys;
pub mod local;
pub mod transient;

// Re-export commonly used types
pub use error::{CleanupError, StorageError, StorageResult};
pub use local::LocalStorage;
pub use transient::{PendingUpload, TransientUpload};
