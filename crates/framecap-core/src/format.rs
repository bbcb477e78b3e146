//! Pixel format introspection.
//!
//! Only the formats an export shader or a depth-stencil target can realistically
//! expose are modeled. Everything else is [`Format::Unknown`], which has no
//! texel size and therefore never produces a readable pitch.

use std::fmt;

use crate::resource::DeviceApi;

/// Row alignment required for texture-to-buffer copies on backends that
/// enforce one (`D3D12_TEXTURE_DATA_PITCH_ALIGNMENT`).
pub const ROW_PITCH_ALIGNMENT: u32 = 256;

/// Texture formats understood by the readback pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Unknown,

    R8G8B8A8Typeless,
    R8G8B8A8Unorm,
    B8G8R8A8Typeless,
    B8G8R8A8Unorm,

    R16Float,
    R16G16B16A16Float,

    R32Typeless,
    R32Float,
    R32G32B32A32Typeless,
    R32G32B32A32Float,

    // Depth-stencil families. Hosts usually expose these typelessly.
    D32Float,
    R24G8Typeless,
    D24UnormS8Uint,
    R24UnormX8Uint,
    R32G8X24Typeless,
    D32FloatS8X24Uint,
    R32FloatX8X24Uint,
}

impl Format {
    /// Bytes occupied by a single texel.
    #[must_use]
    pub const fn bytes_per_texel(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::R16Float => 2,
            Self::R8G8B8A8Typeless
            | Self::R8G8B8A8Unorm
            | Self::B8G8R8A8Typeless
            | Self::B8G8R8A8Unorm
            | Self::R32Typeless
            | Self::R32Float
            | Self::D32Float
            | Self::R24G8Typeless
            | Self::D24UnormS8Uint
            | Self::R24UnormX8Uint => 4,
            Self::R16G16B16A16Float
            | Self::R32G8X24Typeless
            | Self::D32FloatS8X24Uint
            | Self::R32FloatX8X24Uint => 8,
            Self::R32G32B32A32Typeless | Self::R32G32B32A32Float => 16,
        }
    }

    /// Returns true for formats declared without a numeric interpretation.
    #[must_use]
    pub const fn is_typeless(self) -> bool {
        matches!(
            self,
            Self::R8G8B8A8Typeless
                | Self::B8G8R8A8Typeless
                | Self::R32Typeless
                | Self::R32G32B32A32Typeless
                | Self::R24G8Typeless
                | Self::R32G8X24Typeless
        )
    }

    /// Returns true for depth-stencil attachment formats.
    #[must_use]
    pub const fn is_depth_stencil(self) -> bool {
        matches!(
            self,
            Self::D32Float | Self::D24UnormS8Uint | Self::D32FloatS8X24Uint
        )
    }

    /// Maps a typeless or depth-stencil format to the typed format used when
    /// creating a CPU-readable copy of it. Typed color formats map to themselves.
    #[must_use]
    pub const fn default_typed(self) -> Self {
        match self {
            Self::R8G8B8A8Typeless => Self::R8G8B8A8Unorm,
            Self::B8G8R8A8Typeless => Self::B8G8R8A8Unorm,
            Self::R32Typeless | Self::D32Float => Self::R32Float,
            Self::R32G32B32A32Typeless => Self::R32G32B32A32Float,
            Self::R24G8Typeless | Self::D24UnormS8Uint => Self::R24UnormX8Uint,
            Self::R32G8X24Typeless | Self::D32FloatS8X24Uint => Self::R32FloatX8X24Uint,
            other => other,
        }
    }

    /// Number of 32-bit float components per texel, for the formats the
    /// decoder can read as floats.
    #[must_use]
    pub const fn float_channel_count(self) -> Option<u32> {
        match self.default_typed() {
            Self::R32Float => Some(1),
            Self::R32G32B32A32Float => Some(4),
            _ => None,
        }
    }

    /// Upper-case API name, as shown next to texture previews.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::R8G8B8A8Typeless => "R8G8B8A8_TYPELESS",
            Self::R8G8B8A8Unorm => "R8G8B8A8_UNORM",
            Self::B8G8R8A8Typeless => "B8G8R8A8_TYPELESS",
            Self::B8G8R8A8Unorm => "B8G8R8A8_UNORM",
            Self::R16Float => "R16_FLOAT",
            Self::R16G16B16A16Float => "R16G16B16A16_FLOAT",
            Self::R32Typeless => "R32_TYPELESS",
            Self::R32Float => "R32_FLOAT",
            Self::R32G32B32A32Typeless => "R32G32B32A32_TYPELESS",
            Self::R32G32B32A32Float => "R32G32B32A32_FLOAT",
            Self::D32Float => "D32_FLOAT",
            Self::R24G8Typeless => "R24G8_TYPELESS",
            Self::D24UnormS8Uint => "D24_UNORM_S8_UINT",
            Self::R24UnormX8Uint => "R24_UNORM_X8_UINT",
            Self::R32G8X24Typeless => "R32G8X24_TYPELESS",
            Self::D32FloatS8X24Uint => "D32_FLOAT_S8X24_UINT",
            Self::R32FloatX8X24Uint => "R32_FLOAT_X8X24_UINT",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bytes per row of `width` tightly packed texels.
#[must_use]
pub fn row_pitch(format: Format, width: u32) -> u64 {
    u64::from(format.bytes_per_texel()) * u64::from(width)
}

/// Bytes per 2D plane of `height` rows of `row_pitch` bytes, or `None` if
/// the plane does not fit in 64 bits.
#[must_use]
pub fn slice_pitch(_format: Format, row_pitch: u64, height: u32) -> Option<u64> {
    row_pitch.checked_mul(u64::from(height))
}

/// Rounds `pitch` up to a multiple of `alignment`. Alignments of 0 and 1
/// leave it unchanged.
#[must_use]
pub fn align_pitch(pitch: u64, alignment: u32) -> u64 {
    if alignment > 1 {
        let alignment = u64::from(alignment);
        pitch.div_ceil(alignment) * alignment
    } else {
        pitch
    }
}

/// Rounds a row pitch up to [`ROW_PITCH_ALIGNMENT`].
#[must_use]
pub fn align_row_pitch(row_pitch: u64) -> u64 {
    align_pitch(row_pitch, ROW_PITCH_ALIGNMENT)
}

/// Row and slice pitch of the staging buffer used by a texture-to-buffer copy
/// on a device of the given API family.
///
/// Backends that constrain buffer rows get the aligned row pitch. The slice
/// pitch is always derived from whichever row pitch is returned. Returns
/// `None` when the slice pitch overflows.
#[must_use]
pub fn buffer_pitches(
    api: DeviceApi,
    format: Format,
    width: u32,
    height: u32,
) -> Option<(u64, u64)> {
    buffer_pitches_with_alignment(api.buffer_row_alignment(), format, width, height)
}

/// Like [`buffer_pitches`], with an explicit row alignment in bytes.
#[must_use]
pub fn buffer_pitches_with_alignment(
    alignment: u32,
    format: Format,
    width: u32,
    height: u32,
) -> Option<(u64, u64)> {
    let pitch = align_pitch(row_pitch(format, width), alignment);
    Some((pitch, slice_pitch(format, pitch, height)?))
}
