//! Error types for framecap.

use thiserror::Error;

/// The main error type for framecap operations outside the readback path.
#[derive(Error, Debug)]
pub enum FrameCaptureError {
    /// A named shader texture variable is not bound to any resource.
    #[error("texture binding '{0}' is not available")]
    BindingUnavailable(String),

    /// A configuration key could not be read or written.
    #[error("config key '{section}.{key}' could not be accessed")]
    ConfigAccess { section: String, key: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for framecap operations.
pub type Result<T> = std::result::Result<T, FrameCaptureError>;
