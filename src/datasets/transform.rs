//! Image preprocessing shared by the dataset readers.
//!
//! Every reader produces flat CHW tensors scaled to [0, 1], the layout the
//! models consume.

use image::imageops::FilterType;

use crate::error::Result;

/// Scales raw 8-bit samples to [0, 1] without reordering them.
pub fn to_unit_range(bytes: &[u8]) -> Vec<f64> {
    bytes.iter().map(|&b| b as f64 / 255.0).collect()
}

/// Converts interleaved HWC pixels into planar CHW order.
pub fn hwc_to_chw(pixels: &[u8], channels: usize) -> Vec<f64> {
    let plane = pixels.len() / channels;
    let mut out = vec![0.0; pixels.len()];
    for (i, px) in pixels.chunks_exact(channels).enumerate() {
        for (c, &v) in px.iter().enumerate() {
            out[c * plane + i] = v as f64 / 255.0;
        }
    }
    out
}

/// Decodes image bytes, resizes to `width × height` (bilinear), and returns
/// RGB planes normalized to [0, 1].
///
/// Returns a flat `Vec<f64>` of length `3 * width * height`.
pub fn image_bytes_to_rgb_chw(bytes: &[u8], width: u32, height: u32) -> Result<Vec<f64>> {
    let img = image::load_from_memory(bytes)?;
    let resized = if img.width() == width && img.height() == height {
        img
    } else {
        img.resize_exact(width, height, FilterType::Triangle)
    };
    let rgb = resized.to_rgb8();
    Ok(hwc_to_chw(rgb.as_raw(), 3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    #[test]
    fn splits_interleaved_pixels_into_planes() {
        let chw = hwc_to_chw(&[255, 0, 0, 0, 255, 0], 3);
        assert_eq!(chw, vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn decodes_and_resizes_to_requested_shape() {
        let img = RgbImage::from_pixel(4, 2, Rgb([255, 0, 0]));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png).unwrap();

        let tensor = image_bytes_to_rgb_chw(&png, 3, 3).unwrap();
        assert_eq!(tensor.len(), 27);
        assert!(tensor[..9].iter().all(|&r| r > 0.99));
        assert!(tensor[9..].iter().all(|&gb| gb < 0.01));
    }

    #[test]
    fn undecodable_bytes_are_an_error() {
        assert!(image_bytes_to_rgb_chw(b"not an image", 2, 2).is_err());
    }
}
