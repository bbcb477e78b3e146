//! framecap: depth and normal texture export for real-time renderers.
//!
//! An add-on that hooks a host renderer's frame callbacks. When the capture
//! key (F10) is pressed it writes the back buffer as a bitmap and exports the
//! texture an export shader publishes under a fixed name as an OpenEXR file.
//!
//! # Quick Start
//!
//! ```no_run
//! use framecap::*;
//!
//! # fn host<R: EffectRuntime>(runtime: &mut R) -> Result<()> {
//! init();
//! let mut addon = Addon::new(AddonProfile::FrameCapture, JsonConfigStore::open("framecap.json")?);
//! addon.on_init_device();
//! let mut state = addon.on_init_effect_runtime();
//!
//! // every frame
//! addon.on_begin_effects(runtime, &mut state);
//! if let Some(report) = addon.on_present(runtime, &state) {
//!     println!("capture succeeded: {}", report.is_success());
//! }
//!
//! addon.on_destroy_effect_runtime(runtime, state);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`framecap_core`] holds formats, resource descriptors, bindings and settings
//! - [`framecap_render`] moves textures to host memory and encodes them
//! - This crate connects both to the host through [`EffectRuntime`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod addon;
pub mod capture;
pub mod error;
pub mod host;
pub mod naming;
pub mod overlay;
pub mod profile;
pub mod runtime;

pub use addon::Addon;
pub use capture::{
    CaptureReport, CaptureState, CaptureTrigger, ExportOutcome, ExportRecord, TRIGGER_KEY,
};
pub use error::CaptureError;
pub use host::{find_texture_variable, EffectRuntime, TextureVariable};
pub use naming::{CapturePrefix, TIMESTAMP_FORMAT};
pub use overlay::{preview_entries, PreviewEntry};
pub use profile::{
    AddonProfile, ExportTarget, BACK_BUFFER_FILE, DEPTH_FILE, NORMAL_FILE, PREVIEW_TEXTURES,
};
pub use runtime::RuntimeState;

// Re-export core types
pub use framecap_core::{
    BindingLookup, BoundTexture, CaptureSettings, ConfigStore, Format, FrameCaptureError,
    JsonConfigStore, MemoryConfigStore, MemoryHeap, ResourceDesc, ResourceHandle,
    ResourceUsage, ResourceView, Result, TrackedBinding,
};

// Re-export render types
pub use framecap_render::{
    CpuDevice, ExportError, RenderDevice, SamplePrecision, TextureKind, WgpuDevice,
};

/// Installs the `env_logger` logger, configured through `RUST_LOG`.
///
/// Calling this more than once, or after another logger was installed, is
/// harmless.
pub fn init() {
    if env_logger::try_init().is_ok() {
        log::info!("framecap initialized");
    }
}
