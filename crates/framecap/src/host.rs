//! Interfaces the host renderer provides to the add-on.

use std::path::PathBuf;

use framecap_core::ResourceView;
use framecap_render::RenderDevice;

/// Opaque handle to a texture variable of a loaded effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureVariable(pub u64);

/// An effect runtime: one swap chain with its effects, input, and device.
pub trait EffectRuntime {
    /// The device the runtime renders with.
    type Device: RenderDevice + ?Sized;

    /// Returns the runtime's device.
    fn device_mut(&mut self) -> &mut Self::Device;

    /// Returns true if the key with virtual key code `key` went down this frame.
    fn is_key_pressed(&self, key: u32) -> bool;

    /// Size in pixels of the screenshot [`EffectRuntime::capture_screenshot`] produces.
    fn screenshot_size(&self) -> (u32, u32);

    /// Fills `pixels` with the current back buffer as RGBA8, top row first.
    /// Returns false if the host could not capture.
    fn capture_screenshot(&mut self, pixels: &mut [u8]) -> bool;

    /// Calls `callback` for every texture variable of every loaded effect.
    fn enumerate_texture_variables(&self, callback: &mut dyn FnMut(TextureVariable));

    /// Returns the name of a texture variable.
    fn texture_variable_name(&self, variable: TextureVariable) -> Option<String>;

    /// Returns the view bound to a texture variable, or `None` if nothing is bound.
    fn texture_binding(&self, variable: TextureVariable) -> Option<ResourceView>;

    /// Path of the host executable; output files are named after it.
    fn executable_path(&self) -> PathBuf {
        std::env::current_exe().unwrap_or_default()
    }
}

/// Finds the first texture variable called `name`.
pub fn find_texture_variable<R: EffectRuntime + ?Sized>(
    runtime: &R,
    name: &str,
) -> Option<TextureVariable> {
    let mut found = None;
    runtime.enumerate_texture_variables(&mut |variable| {
        if found.is_none() && runtime.texture_variable_name(variable).as_deref() == Some(name) {
            found = Some(variable);
        }
    });
    found
}
