//! Image decoding, downscaling, and base64 encoding for the vision call.
//!
//! Uploads arrive as JPEG, PNG, BMP, or TIFF; everything is re-encoded to
//! JPEG and downscaled to a bounded edge length before going on the wire,
//! which keeps the inline-base64 payload within what the hosted endpoint
//! accepts.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

use crate::error::AnalysisError;

/// Maximum edge length for images sent to the hosted model.
pub const MAX_IMAGE_DIMENSION: u32 = 1024;

/// Media type of the encoded payload.
pub const IMAGE_MEDIA_TYPE: &str = "image/jpeg";

/// Prepare raw image bytes for the vision call: decode, downscale, encode.
///
/// Returns a base64 JPEG string ready for a `data:` URL.
///
/// # Errors
/// `AnalysisError::InvalidInput` when the bytes are not a decodable image.
pub fn prepare_image(image_bytes: &[u8]) -> Result<String, AnalysisError> {
    let img = image::load_from_memory(image_bytes).map_err(|e| {
        AnalysisError::InvalidInput(format!(
            "Could not decode image: {}. Supported formats: JPEG, PNG, BMP, TIFF.",
            e
        ))
    })?;

    debug!("Loaded image: {}x{}", img.width(), img.height());
    let resized = downscale_if_needed(img, MAX_IMAGE_DIMENSION);

    let jpeg_bytes = encode_to_jpeg(&resized)?;
    debug!(
        "Encoded upload to {}x{} JPEG ({} bytes)",
        resized.width(),
        resized.height(),
        jpeg_bytes.len()
    );

    Ok(STANDARD.encode(&jpeg_bytes))
}

/// Decode a base64 image payload, tolerating a `data:image/...;base64,` prefix.
///
/// # Errors
/// `AnalysisError::InvalidInput` on undecodable base64.
pub fn decode_base64_image(payload: &str) -> Result<Vec<u8>, AnalysisError> {
    let trimmed = payload.trim();
    let body = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, b)| b)
            .ok_or_else(|| AnalysisError::InvalidInput("Malformed data URL".to_string()))?,
        None => trimmed,
    };

    STANDARD
        .decode(body)
        .map_err(|e| AnalysisError::InvalidInput(format!("Invalid base64 image data: {}", e)))
}

/// Downscale when either edge exceeds `max_dimension`, keeping aspect ratio.
fn downscale_if_needed(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (img.width(), img.height());
    if width <= max_dimension && height <= max_dimension {
        return img;
    }

    let scale = max_dimension as f32 / width.max(height) as f32;
    let new_width = (width as f32 * scale) as u32;
    let new_height = (height as f32 * scale) as u32;
    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

fn encode_to_jpeg(img: &DynamicImage) -> Result<Vec<u8>, AnalysisError> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|e| AnalysisError::InvalidInput(format!("Failed to encode image: {}", e)))?;
    Ok(buffer.into_inner())
}
