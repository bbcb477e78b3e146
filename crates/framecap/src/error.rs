//! Capture error types.

use framecap_render::ScreenshotError;
use thiserror::Error;

/// Errors that can occur while writing the back-buffer screenshot.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The host did not deliver screenshot pixels.
    #[error("host could not capture a {width}x{height} screenshot")]
    ScreenshotUnavailable { width: u32, height: u32 },

    /// The bitmap could not be written.
    #[error(transparent)]
    Screenshot(#[from] ScreenshotError),
}
