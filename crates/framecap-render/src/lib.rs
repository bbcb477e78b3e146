//! Readback pipeline for framecap.
//!
//! This crate moves GPU textures into host memory and writes them to disk:
//! - The [`RenderDevice`] capability interface, with a wgpu backend and a
//!   host-memory backend
//! - [`Readback`], which picks a transfer strategy and owns the intermediate
//! - Texel decoding into three-channel float pixels
//! - EXR encoding for float images and BMP encoding for screenshots

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Texel indices are bounded by texture dimensions
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod cpu_device;
pub mod decode;
pub mod device;
pub mod error;
pub mod export;
pub mod hdr;
pub mod readback;
pub mod screenshot;
pub mod wgpu_device;

pub use cpu_device::{CpuDevice, DeviceCall};
pub use decode::{decode, PixelBuffer, TextureKind};
pub use device::{MappedRegion, RenderDevice};
pub use error::{DecodeError, EncodeError, ExportError, TransferError, TransferResult};
pub use export::{channel_count_for, export_texture};
pub use hdr::{encode_hdr, write_exr, SamplePrecision, CHANNEL_NAMES};
pub use readback::{Readback, TransferStrategy};
pub use screenshot::{save_bitmap, screenshot_len, ScreenshotError, SCREENSHOT_BYTES_PER_PIXEL};
pub use wgpu_device::{format_from_wgpu, format_to_wgpu, WgpuDevice};
