//! Constants shared across the upload pipeline and the HTTP surface.

/// Upload endpoint path
pub const UPLOAD_ROUTE: &str = "/api/upload";

/// Multipart field carrying the image
pub const UPLOAD_FIELD_NAME: &str = "image";

/// Static route serving the transformed variants
pub const PROCESSED_ROUTE: &str = "/processed";

/// Static route serving the transient uploads
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Extension of every generated variant
pub const OUTPUT_EXTENSION: &str = "jpg";

/// Client-facing message for any transform failure
pub const PROCESSING_ERROR_MESSAGE: &str = "Error processing image";

pub const BYTES_PER_MB: usize = 1024 * 1024;
