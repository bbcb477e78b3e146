//! Text of the preview entries the settings overlay shows.

use framecap_core::{BoundTexture, ResourceView, TrackedBinding, RAW_DEPTH_TEXTURE_NAME};
use framecap_render::RenderDevice;

use crate::host::{find_texture_variable, EffectRuntime};
use crate::profile::{AddonProfile, PREVIEW_TEXTURES};

/// One previewed texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    /// `label | WxH | FORMAT` when bound, an error line otherwise.
    pub text: String,
    /// View to draw, if bound.
    pub view: Option<ResourceView>,
}

/// Builds preview entries for every preview texture variable the loaded
/// effects declare. Variables that do not exist produce no entry.
pub fn preview_entries<R: EffectRuntime + ?Sized>(
    runtime: &mut R,
    profile: AddonProfile,
) -> Vec<PreviewEntry> {
    let sources: &[(&str, &str)] = match profile {
        AddonProfile::FrameCapture => &PREVIEW_TEXTURES,
        AddonProfile::RawDepthExport => &[(RAW_DEPTH_TEXTURE_NAME, RAW_DEPTH_TEXTURE_NAME)],
    };

    let mut entries = Vec::new();
    for &(variable_name, label) in sources {
        let Some(variable) = find_texture_variable(&*runtime, variable_name) else {
            continue;
        };
        let view = runtime
            .texture_binding(variable)
            .filter(|view| !view.is_null());
        let bound = view.and_then(|view| {
            let device = runtime.device_mut();
            let resource = device.resource_from_view(view)?;
            let desc = device.resource_desc(resource)?;
            Some(BoundTexture {
                resource,
                desc,
                view,
            })
        });

        let mut binding = TrackedBinding::new(label);
        let text = match bound {
            Some(bound) => {
                binding.update(bound);
                binding.summary()
            }
            None => None,
        };
        entries.push(match text {
            Some(text) => PreviewEntry {
                text,
                view: binding.view(),
            },
            None => PreviewEntry {
                text: missing_text(profile, label),
                view: None,
            },
        });
    }
    entries
}

fn missing_text(profile: AddonProfile, label: &str) -> String {
    match profile {
        AddonProfile::FrameCapture => format!("{label} not found!"),
        AddonProfile::RawDepthExport => {
            "Depth texture not found. Is DepthToAddon.fx enabled?".to_owned()
        }
    }
}
