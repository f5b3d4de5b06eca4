// src/services/image_processor.rs
use crate::errors::PromptMintError;
use crate::models::{NormalizedImage, OutputFormat};
use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat as ImgFormat};
use log::debug;

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Decodes a base64 image, resizes it to exactly `width` x `height` and
    /// re-encodes it. Smaller sources are scaled up.
    pub fn normalize(
        &self,
        source_base64: &str,
        width: u32,
        height: u32,
        format: OutputFormat,
        quality: u8,
    ) -> Result<NormalizedImage, PromptMintError> {
        if width == 0 || height == 0 {
            return Err(PromptMintError::ImageProcessing(format!(
                "Target dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }

        let data = decode_base64(source_base64)?;
        let img = image::load_from_memory(&data)
            .map_err(|e| PromptMintError::ImageProcessing(format!("Failed to load image: {}", e)))?;

        let (source_width, source_height) = img.dimensions();
        let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
        let output = encode(&resized, format, quality)?;

        debug!(
            "Normalized {}x{} ({} bytes) to {}x{} {} ({} bytes)",
            source_width,
            source_height,
            data.len(),
            width,
            height,
            format,
            output.len()
        );

        Ok(NormalizedImage {
            base64: general_purpose::STANDARD.encode(&output),
            format,
            byte_length: output.len(),
            width,
            height,
            source_width,
            source_height,
        })
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts bare base64 as well as `data:<mime>;base64,<payload>` URIs.
pub fn decode_base64(source: &str) -> Result<Vec<u8>, PromptMintError> {
    let payload = match source.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => source,
    };

    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| PromptMintError::ImageProcessing(format!("Invalid base64 payload: {}", e)))
}

fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>, PromptMintError> {
    let mut output = Vec::new();
    match format {
        OutputFormat::Png => img
            .write_to(&mut std::io::Cursor::new(&mut output), ImgFormat::Png)
            .map_err(|e| {
                PromptMintError::ImageProcessing(format!("Failed to encode PNG image: {}", e))
            })?,
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100));
            encoder
                .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
                .map_err(|e| {
                    PromptMintError::ImageProcessing(format!("Failed to encode JPEG image: {}", e))
                })?;
        }
    }
    Ok(output)
}
