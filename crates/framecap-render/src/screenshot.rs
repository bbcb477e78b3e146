//! Bitmap output for the 8-bit back-buffer screenshot.

use image::{ImageBuffer, Rgba};
use std::path::Path;

/// Bytes per RGBA8 pixel.
pub const SCREENSHOT_BYTES_PER_PIXEL: usize = 4;

/// Returns the buffer size needed for a `width` x `height` RGBA8 screenshot.
pub fn screenshot_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * SCREENSHOT_BYTES_PER_PIXEL
}

/// Saves raw RGBA8 pixel data as a 32-bit BMP file.
///
/// # Arguments
/// * `path` - Output file path
/// * `data` - Raw RGBA pixel data (4 bytes per pixel, top row first), as
///   returned by the host's screenshot call
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Errors
/// Returns an error if the buffer does not match the dimensions or the file
/// cannot be written.
pub fn save_bitmap(path: &Path, data: &[u8], width: u32, height: u32) -> Result<(), ScreenshotError> {
    if data.len() != screenshot_len(width, height) {
        return Err(ScreenshotError::InvalidImageData {
            expected: screenshot_len(width, height),
            actual: data.len(),
        });
    }

    let img: ImageBuffer<Rgba<u8>, &[u8]> =
        ImageBuffer::from_raw(width, height, data).ok_or(ScreenshotError::InvalidImageData {
            expected: screenshot_len(width, height),
            actual: data.len(),
        })?;
    img.save_with_format(path, image::ImageFormat::Bmp)?;

    Ok(())
}

/// Error type for screenshot operations.
#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("Image encoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid image data: expected {expected} bytes, got {actual}")]
    InvalidImageData { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_round_trip() {
        let path = std::env::temp_dir().join(format!("framecap_shot_{}.bmp", std::process::id()));
        let data: Vec<u8> = (0u8..4)
            .flat_map(|i| [i * 10, i * 10 + 1, i * 10 + 2, 255])
            .collect();
        save_bitmap(&path, &data, 2, 2).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 0).0, [10, 11, 12, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [20, 21, 22, 255]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        let path = std::env::temp_dir().join("framecap_shot_short.bmp");
        let result = save_bitmap(&path, &[0u8; 15], 2, 2);
        assert!(matches!(
            result,
            Err(ScreenshotError::InvalidImageData { expected: 16, actual: 15 })
        ));
    }

    #[test]
    fn test_screenshot_len() {
        assert_eq!(screenshot_len(1920, 1080), 1920 * 1080 * 4);
        assert_eq!(screenshot_len(0, 10), 0);
    }
}
