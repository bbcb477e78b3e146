//! Core types for framecap.
//!
//! This crate provides the data model shared by the readback pipeline and the
//! capture add-on:
//! - [`Format`] introspection (texel sizes, row and slice pitch, typed mapping)
//! - Resource handles and descriptors ([`ResourceDesc`], [`MemoryHeap`], ...)
//! - [`TrackedBinding`] for named shader texture variables
//! - [`CaptureSettings`] and the [`ConfigStore`] they persist through

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod binding;
pub mod error;
pub mod format;
pub mod resource;
pub mod settings;

pub use binding::{
    BindingLookup, BoundTexture, TrackedBinding, EXPORT_TEXTURE_NAME, RAW_DEPTH_TEXTURE_NAME,
};
pub use error::{FrameCaptureError, Result};
pub use format::{
    align_pitch, align_row_pitch, buffer_pitches, buffer_pitches_with_alignment, row_pitch,
    slice_pitch, Format, ROW_PITCH_ALIGNMENT,
};
pub use resource::{
    DeviceApi, DeviceCaps, MemoryHeap, ResourceDesc, ResourceDimension, ResourceHandle,
    ResourceUsage, ResourceView, TextureExtent,
};
pub use settings::{CaptureSettings, ConfigStore, JsonConfigStore, MemoryConfigStore};
