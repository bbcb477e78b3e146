//! Tracking of shader texture variables exposed by name.
//!
//! Export shaders publish the textures the add-on reads back through texture
//! variables with fixed names. The binding behind such a name can change from
//! frame to frame, so it is refreshed once per frame and read at capture time.

use crate::resource::{ResourceDesc, ResourceHandle, ResourceView};

/// Texture variable written by the frame capture export shader.
pub const EXPORT_TEXTURE_NAME: &str = "DepthToAddon_ExportTex";

/// Texture variable written by the raw depth buffer export shader.
pub const RAW_DEPTH_TEXTURE_NAME: &str = "DepthToAddonTex";

/// A resource bound to a texture variable, with its descriptor and view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundTexture {
    pub resource: ResourceHandle,
    pub desc: ResourceDesc,
    pub view: ResourceView,
}

/// Result of resolving a texture variable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingLookup {
    Found(BoundTexture),
    Absent,
}

impl BindingLookup {
    /// Converts into an `Option`.
    pub fn found(self) -> Option<BoundTexture> {
        match self {
            Self::Found(bound) => Some(bound),
            Self::Absent => None,
        }
    }
}

/// Association between a named texture variable and what is bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedBinding {
    name: String,
    bound: Option<BoundTexture>,
}

impl TrackedBinding {
    /// Creates an empty binding for the texture variable `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bound: None,
        }
    }

    /// Name of the tracked texture variable.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records the texture currently bound to the variable.
    pub fn update(&mut self, bound: BoundTexture) {
        self.bound = Some(bound);
    }

    /// Forgets the bound texture.
    pub fn reset(&mut self) {
        self.bound = None;
    }

    /// Returns the tracked texture, if any.
    pub fn lookup(&self) -> BindingLookup {
        self.bound.map_or(BindingLookup::Absent, BindingLookup::Found)
    }

    /// Returns the view held by this binding, if any.
    pub fn view(&self) -> Option<ResourceView> {
        self.bound.map(|b| b.view).filter(|v| !v.is_null())
    }

    /// One-line label in the form `name | WxH | FORMAT`.
    pub fn summary(&self) -> Option<String> {
        let extent = self.bound?.desc.texture_extent()?;
        Some(format!(
            "{} | {}x{} | {}",
            self.name, extent.width, extent.height, extent.format
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use crate::resource::{MemoryHeap, ResourceUsage};

    fn bound() -> BoundTexture {
        BoundTexture {
            resource: ResourceHandle(3),
            desc: ResourceDesc::texture(
                640,
                480,
                Format::R32G32B32A32Float,
                MemoryHeap::GpuOnly,
                ResourceUsage::SHADER_RESOURCE,
            ),
            view: ResourceView(4),
        }
    }

    #[test]
    fn test_update_and_reset() {
        let mut binding = TrackedBinding::new(EXPORT_TEXTURE_NAME);
        assert_eq!(binding.lookup(), BindingLookup::Absent);

        binding.update(bound());
        assert_eq!(binding.lookup(), BindingLookup::Found(bound()));
        assert_eq!(binding.view(), Some(ResourceView(4)));

        binding.reset();
        assert_eq!(binding.lookup().found(), None);
        assert_eq!(binding.view(), None);
    }

    #[test]
    fn test_summary() {
        let mut binding = TrackedBinding::new("DepthTex");
        assert!(binding.summary().is_none());
        binding.update(bound());
        assert_eq!(
            binding.summary().as_deref(),
            Some("DepthTex | 640x480 | R32G32B32A32_FLOAT")
        );
    }
}
