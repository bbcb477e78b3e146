//! State kept for each active effect runtime.

use framecap_core::{BindingLookup, BoundTexture, TrackedBinding};
use framecap_render::RenderDevice;

use crate::host::{find_texture_variable, EffectRuntime};

/// Per-runtime state, created when a runtime initializes and consumed when
/// it is destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeState {
    binding: TrackedBinding,
}

impl RuntimeState {
    /// Creates state tracking the texture variable `binding_name`.
    pub fn new(binding_name: &str) -> Self {
        Self {
            binding: TrackedBinding::new(binding_name),
        }
    }

    /// The tracked export binding.
    pub fn binding(&self) -> &TrackedBinding {
        &self.binding
    }

    /// Re-resolves the tracked binding from the runtime's texture variables.
    ///
    /// The binding is cleared when the variable does not exist, has nothing
    /// bound, or the bound view no longer resolves to a resource.
    pub fn refresh<R: EffectRuntime + ?Sized>(&mut self, runtime: &mut R) {
        let Some(view) = find_texture_variable(&*runtime, self.binding.name())
            .and_then(|variable| runtime.texture_binding(variable))
            .filter(|view| !view.is_null())
        else {
            self.binding.reset();
            return;
        };

        let device = runtime.device_mut();
        let resolved = device.resource_from_view(view).and_then(|resource| {
            device
                .resource_desc(resource)
                .map(|desc| BoundTexture { resource, desc, view })
        });
        match resolved {
            Some(bound) => self.binding.update(bound),
            None => {
                log::warn!(
                    "View {view:?} bound to '{}' does not resolve to a resource",
                    self.binding.name()
                );
                self.binding.reset();
            }
        }
    }

    /// Current lookup result for the tracked binding.
    pub fn lookup(&self) -> BindingLookup {
        self.binding.lookup()
    }

    /// Releases device objects held by the state.
    pub fn release<D: RenderDevice + ?Sized>(self, device: &mut D) {
        if let Some(view) = self.binding.view() {
            device.destroy_resource_view(view);
        }
    }
}
