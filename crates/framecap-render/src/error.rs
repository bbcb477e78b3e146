//! Readback pipeline error types.

use std::path::PathBuf;

use framecap_core::{Format, ResourceHandle};
use thiserror::Error;

/// Errors that can occur while moving a texture into CPU memory.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The handle is null or the descriptor is not a 2D texture.
    #[error("resource {0:?} is not a readable 2D texture")]
    NotATexture(ResourceHandle),

    /// The source cannot be copied because it lacks copy-source usage.
    #[error("resource {0:?} was not created with copy-source usage")]
    MissingCopySource(ResourceHandle),

    /// The host-visible intermediate resource could not be created.
    #[error("failed to create system memory {0} for texture dumping")]
    ResourceCreation(&'static str),

    /// Mapping the resource for reading failed.
    #[error("failed to map resource {0:?} for reading")]
    MapFailed(ResourceHandle),

    /// The staging pitches of the texture do not fit the device's pitch types.
    #[error("pitch of a {width}x{height} {format} texture overflows")]
    PitchOverflow {
        width: u32,
        height: u32,
        format: Format,
    },
}

/// Errors that can occur while reinterpreting mapped texels.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The format/channel-count combination has no decoder.
    #[error("unsupported format {format} with {channels} channel(s) for {kind} texture")]
    UnsupportedFormat {
        format: Format,
        channels: u32,
        kind: &'static str,
    },

    /// The mapped region ends before the last texel that must be read.
    #[error("mapped region too small: need {needed} bytes, have {actual}")]
    RegionTooSmall { needed: usize, actual: usize },
}

/// Errors that can occur while writing an EXR file.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// Pixel buffer length does not match the image dimensions.
    #[error("pixel buffer holds {actual} floats, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Image has no pixels.
    #[error("EXR dimensions must be positive, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// The EXR writer failed.
    #[error("failed to write EXR to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: exr::error::Error,
    },
}

/// Any failure of a single texture export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// A specialized Result type for readback operations.
pub type TransferResult<T> = std::result::Result<T, TransferError>;
