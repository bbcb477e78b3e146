//! The two add-on flavours: frame capture and raw depth export.

use framecap_core::{CaptureSettings, EXPORT_TEXTURE_NAME, RAW_DEPTH_TEXTURE_NAME};
use framecap_render::{SamplePrecision, TextureKind};

/// File name suffix of the 8-bit screenshot.
pub const BACK_BUFFER_FILE: &str = "BackBuffer.bmp";
/// File name suffix of the depth export.
pub const DEPTH_FILE: &str = "DepthBuffer.exr";
/// File name suffix of the normal export.
pub const NORMAL_FILE: &str = "NormalMap.exr";

/// Texture variables shown in the preview overlay of the frame capture profile.
pub const PREVIEW_TEXTURES: [(&str, &str); 2] = [
    ("DepthToAddon_DepthTex", "DepthTex"),
    ("DepthToAddon_NormalTex", "NormalTex"),
];

/// One texture written per capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportTarget {
    pub kind: TextureKind,
    /// Suffix appended to the capture prefix.
    pub file_name: &'static str,
}

/// Which add-on behaviour is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddonProfile {
    /// Depth and normal export next to the screenshot, toggled by settings.
    #[default]
    FrameCapture,
    /// Unconditional export of the packed depth texture.
    RawDepthExport,
}

impl AddonProfile {
    /// Display name registered with the host.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::FrameCapture => "Frame Capture",
            Self::RawDepthExport => "Raw Depth Buffer Export",
        }
    }

    /// One-line description registered with the host.
    pub const fn description(self) -> &'static str {
        match self {
            Self::FrameCapture => {
                "Captures depth and normal textures to 32-bit .exr along with the screenshot. Press F10 to capture."
            }
            Self::RawDepthExport => {
                "Exports the depth texture to 16-bit .exr along with the screenshot. Press F10 to capture."
            }
        }
    }

    /// Name of the texture variable exports read from.
    pub const fn binding_name(self) -> &'static str {
        match self {
            Self::FrameCapture => EXPORT_TEXTURE_NAME,
            Self::RawDepthExport => RAW_DEPTH_TEXTURE_NAME,
        }
    }

    /// Separator between the executable path and the timestamp.
    pub const fn separator(self) -> char {
        match self {
            Self::FrameCapture => ' ',
            Self::RawDepthExport => '_',
        }
    }

    pub const fn precision(self) -> SamplePrecision {
        match self {
            Self::FrameCapture => SamplePrecision::F32,
            Self::RawDepthExport => SamplePrecision::F16,
        }
    }

    /// Whether the trigger key only captures with capture enabled in settings.
    pub const fn requires_enable_flag(self) -> bool {
        matches!(self, Self::FrameCapture)
    }

    /// Exports to run on a capture, in order.
    ///
    /// Every target reads [`AddonProfile::binding_name`]. With both
    /// FrameCapture toggles on, the bound texture matches at most one kind,
    /// so the other export is reported as failed with an unsupported format.
    pub fn export_targets(self, settings: &CaptureSettings) -> Vec<ExportTarget> {
        match self {
            Self::FrameCapture => {
                let mut targets = Vec::with_capacity(2);
                if settings.export_depth {
                    targets.push(ExportTarget {
                        kind: TextureKind::Depth,
                        file_name: DEPTH_FILE,
                    });
                }
                if settings.export_normal {
                    targets.push(ExportTarget {
                        kind: TextureKind::Normal,
                        file_name: NORMAL_FILE,
                    });
                }
                targets
            }
            Self::RawDepthExport => vec![ExportTarget {
                kind: TextureKind::PackedDepth,
                file_name: DEPTH_FILE,
            }],
        }
    }
}
