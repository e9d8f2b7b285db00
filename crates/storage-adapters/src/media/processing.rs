//! Server-side preparation of uploaded images.
//!
//! Every upload is decoded (which rejects anything that is not an image),
//! scaled down to fit `max_dimension` and re-encoded as JPEG. The output is
//! what gets stored, never the client's original bytes.

use std::io::Cursor;

use bytes::Bytes;
use domains::{DomainError, ImageUpload, MediaProcessor, PreparedImage, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

pub struct ImageProcessor {
    max_dimension: u32,
    max_upload_bytes: usize,
    quality: u8,
}

impl ImageProcessor {
    pub fn new(max_dimension: u32, max_upload_bytes: usize, quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            max_upload_bytes,
            quality: quality.clamp(1, 100),
        }
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new(1200, 10 * 1024 * 1024, 80)
    }
}

impl MediaProcessor for ImageProcessor {
    fn prepare(&self, upload: &ImageUpload) -> Result<PreparedImage> {
        if upload.bytes.is_empty() {
            return Err(DomainError::validation("uploaded file is empty"));
        }
        if upload.bytes.len() > self.max_upload_bytes {
            return Err(DomainError::validation(format!(
                "uploaded file exceeds {} bytes",
                self.max_upload_bytes
            )));
        }

        let decoded = ImageReader::new(Cursor::new(&upload.bytes))
            .with_guessed_format()
            .map_err(|e| DomainError::internal(e.to_string()))?
            .decode()
            .map_err(|e| {
                tracing::debug!(file = ?upload.file_name, error = %e, "upload rejected");
                DomainError::validation("uploaded file is not a supported image")
            })?;

        let resized = if decoded.width() > self.max_dimension || decoded.height() > self.max_dimension {
            decoded.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        } else {
            decoded
        };
        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        let mut out = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, self.quality))
            .map_err(|e| DomainError::internal(format!("jpeg encoding failed: {e}")))?;

        Ok(PreparedImage {
            bytes: Bytes::from(out),
            content_type: mime::IMAGE_JPEG,
            extension: "jpg",
        })
    }
}
