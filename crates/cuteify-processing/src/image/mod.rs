//! Image processing module
//!
//! - Cover-and-crop resizing (resize)
//! - Rotation by a variant's angle (orientation)
//! - Decode, transform and JPEG re-encode of one variant (transformer)

pub mod orientation;
pub mod resize;
pub mod transformer;

pub use orientation::ImageOrientation;
pub use resize::ImageResize;
pub use transformer::ImageTransformer;
