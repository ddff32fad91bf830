//! Image transformer - produces one variant from the source bytes
//!
//! decode → fit to the variant box → rotate → JPEG encode

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::error::TransformError;
use crate::image::orientation::ImageOrientation;
use crate::image::resize::ImageResize;
use crate::variants::TransformDescriptor;

/// Stateless image transformer
pub struct ImageTransformer;

impl ImageTransformer {
    /// Decode an image, guessing the format from its content
    pub fn decode(data: &[u8]) -> Result<DynamicImage, TransformError> {
        image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode(image::ImageError::IoError(e)))?
            .decode()
            .map_err(TransformError::Decode)
    }

    /// Encode as baseline JPEG; alpha is dropped
    pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, TransformError> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut buffer = Vec::with_capacity((width * height) as usize / 4);

        JpegEncoder::new_with_quality(&mut buffer, quality)
            .encode_image(&rgb)
            .map_err(TransformError::Encode)?;

        Ok(buffer)
    }

    /// Render one variant from the source image bytes
    pub fn render_variant(
        data: &[u8],
        descriptor: &TransformDescriptor,
        quality: u8,
    ) -> Result<Vec<u8>, TransformError> {
        let img = Self::decode(data)?;

        let resized = ImageResize::cover(&img, descriptor.width, descriptor.height);

        tracing::trace!(
            suffix = descriptor.suffix,
            rotation = descriptor.rotation.degrees(),
            "Applying rotation"
        );
        let rotated = ImageOrientation::rotate(resized, descriptor.rotation);

        Self::encode_jpeg(&rotated, quality)
    }
}
