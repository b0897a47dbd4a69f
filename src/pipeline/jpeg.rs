// image crate: rendered page -> JPEG bytes for embedding.

use crate::error::StampwiseError;
use image::{DynamicImage, RgbImage, RgbaImage};
use std::io::Cursor;

/// Encode raw RGBA pixel data to JPEG bytes.
///
/// Converts RGBA to RGB (dropping the alpha channel) and compresses with
/// the specified quality (1-100).
pub fn encode_rgba_to_jpeg(
    rgba: &RgbaImage,
    quality: u8,
) -> crate::error::Result<Vec<u8>> {
    let dynamic = DynamicImage::ImageRgba8(rgba.clone());
    encode_rgb_to_jpeg(&dynamic.to_rgb8(), quality)
}

/// Encode an RGB image to JPEG bytes at the given quality.
pub fn encode_rgb_to_jpeg(rgb: &RgbImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(StampwiseError::composite(format!(
            "JPEG quality must be 1-100, got {}",
            quality
        )));
    }

    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| StampwiseError::composite(format!("JPEG encode failed: {e}")))?;

    Ok(buf.into_inner())
}
