//! Image normalization for the recognition model.
//!
//! Converts raw image bytes into the flat `[-1, 1]` float layout the
//! pre-trained model was trained on: resize to a fixed height of 64 while
//! preserving the aspect ratio, convert to grayscale, then scale each pixel.
//! Any deviation from this recipe silently degrades recognition accuracy, so
//! every step is deterministic.

use crate::core::errors::{OcrError, OcrResult};
use image::imageops::FilterType;
use ndarray::Array4;

/// Fixed input height the recognition model expects.
pub const TARGET_HEIGHT: u32 = 64;

/// A single-channel image flattened into the model's input layout.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// Row-major pixel values in `[-1.0, 1.0]`, length `width * height`.
    pub data: Vec<f32>,
    /// Width after resizing.
    pub width: u32,
    /// Height after resizing, always [`TARGET_HEIGHT`].
    pub height: u32,
}

impl NormalizedImage {
    /// Reshapes the flat buffer into the `[1, 1, height, width]` input tensor.
    pub fn into_tensor(self) -> OcrResult<Array4<f32>> {
        let (width, height) = (self.width as usize, self.height as usize);
        Ok(Array4::from_shape_vec((1, 1, height, width), self.data)?)
    }
}

/// Normalizes captcha images into model input buffers.
#[derive(Debug, Clone)]
pub struct CaptchaNormalizer {
    target_height: u32,
}

impl CaptchaNormalizer {
    /// Creates a normalizer with the model's fixed target height.
    pub fn new() -> Self {
        Self {
            target_height: TARGET_HEIGHT,
        }
    }

    /// Decodes, resizes, grayscales, and scales an image into a
    /// [`NormalizedImage`].
    ///
    /// Fails with [`OcrError::EmptyInput`] on a zero-length buffer and
    /// [`OcrError::ImageDecode`] on bytes that are not a supported image
    /// format (JPEG, PNG, BMP, and the other formats the image crate decodes
    /// by default).
    pub fn normalize(&self, image_bytes: &[u8]) -> OcrResult<NormalizedImage> {
        if image_bytes.is_empty() {
            return Err(OcrError::empty_input("image buffer"));
        }

        let image = image::load_from_memory(image_bytes)?;
        let (src_width, src_height) = (image.width(), image.height());
        if src_width == 0 || src_height == 0 {
            return Err(OcrError::invalid_image(format!(
                "source dimensions {src_width}x{src_height} are not usable"
            )));
        }

        // Real-number division before flooring keeps the source aspect
        // ratio; integer division would skew narrow images.
        let target_width = ((src_width as f64)
            * (self.target_height as f64 / src_height as f64))
            .floor() as u32;
        let target_width = target_width.max(1);

        // The target box already matches the source aspect ratio, so an
        // exact resize is equivalent to max-fit containment without padding
        // and guarantees the fixed output height.
        let resized = image.resize_exact(target_width, self.target_height, FilterType::CatmullRom);
        let gray = resized.to_luma8();

        // The image crate stores pixels contiguously in row-major order.
        let data: Vec<f32> = gray
            .pixels()
            .map(|pixel| pixel.0[0] as f32 / 255.0 * 2.0 - 1.0)
            .collect();

        tracing::debug!(
            "normalized {}x{} image to {}x{}",
            src_width,
            src_height,
            target_width,
            self.target_height
        );

        Ok(NormalizedImage {
            data,
            width: target_width,
            height: self.target_height,
        })
    }
}

impl Default for CaptchaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
