use image::DynamicImage;

use crate::variants::Rotation;

/// Image orientation operations
pub struct ImageOrientation;

impl ImageOrientation {
    /// Rotate image clockwise by a variant rotation
    pub fn rotate(img: DynamicImage, rotation: Rotation) -> DynamicImage {
        match rotation {
            Rotation::Deg0 => img,
            Rotation::Deg90 => img.rotate90(),
            Rotation::Deg180 => img.rotate180(),
            Rotation::Deg270 => img.rotate270(),
        }
    }
}
