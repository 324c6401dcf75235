//! Image ingress: one explicit decode step producing the canonical
//! in-memory representation used by the rest of the pipeline.
//!
//! Every entry point (HTTP upload, demo widget, raw pixel buffers)
//! funnels through these functions so that decode and shape failures
//! surface as explicit errors instead of ad-hoc coercion downstream.

use crate::error::{Error, Result};
use image::{DynamicImage, GrayImage, RgbImage};

/// Decode raw image bytes (PNG, JPEG, GIF, WebP, BMP) into the
/// canonical representation.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(Error::decode("empty image payload"));
    }
    image::load_from_memory(bytes)
        .map_err(|e| Error::decode(format!("failed to decode image bytes: {e}")))
}

/// Build an image from a raw H×W grayscale pixel buffer.
pub fn image_from_luma(width: u32, height: u32, pixels: Vec<u8>) -> Result<DynamicImage> {
    let expected = width as usize * height as usize;
    if pixels.len() != expected {
        return Err(Error::shape(format!(
            "grayscale buffer has {} pixels, expected {}x{}={}",
            pixels.len(),
            width,
            height,
            expected
        )));
    }
    let buf = GrayImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::shape("grayscale buffer does not match dimensions"))?;
    Ok(DynamicImage::ImageLuma8(buf))
}

/// Build an image from a raw H×W×3 interleaved RGB pixel buffer.
pub fn image_from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<DynamicImage> {
    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected {
        return Err(Error::shape(format!(
            "rgb buffer has {} bytes, expected {}x{}x3={}",
            pixels.len(),
            width,
            height,
            expected
        )));
    }
    let buf = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::shape("rgb buffer does not match dimensions"))?;
    Ok(DynamicImage::ImageRgb8(buf))
}

/// Coerce any decoded image to 3-channel RGB. Grayscale and alpha
/// variants are converted; RGB passes through.
pub fn to_rgb(image: &DynamicImage) -> RgbImage {
    image.to_rgb8()
}
