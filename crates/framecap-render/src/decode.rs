//! Reinterpreting mapped texels as three-channel float pixels.

use std::fmt;

use framecap_core::{Format, ResourceDesc};

use crate::device::MappedRegion;
use crate::error::DecodeError;

const COMPONENT_SIZE: usize = std::mem::size_of::<f32>();

/// Semantic kind of an exported texture, which decides the channel mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Single float channel, broadcast into blue, green and red.
    Depth,
    /// Four float channels; the first three become blue, green, red and the
    /// fourth is dropped.
    Normal,
    /// Depth packed into four float channels by the export shader; the first
    /// three become red, green and blue, so red holds the first channel.
    PackedDepth,
}

impl TextureKind {
    /// Float channels per source texel this kind decodes.
    pub const fn channel_count(self) -> u32 {
        match self {
            Self::Depth => 1,
            Self::Normal | Self::PackedDepth => 4,
        }
    }

    /// Lower-case name used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Depth => "depth",
            Self::Normal => "normal",
            Self::PackedDepth => "packed depth",
        }
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Three-channel float image, row-major, channels stored as (B, G, R).
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl PixelBuffer {
    /// Number of channels per pixel.
    pub const CHANNELS: usize = 3;

    /// Wraps `data` laid out as (B, G, R) triples. Returns `None` if the
    /// length does not match the dimensions.
    pub fn from_bgr(width: u32, height: u32, data: Vec<f32>) -> Option<Self> {
        (data.len() == width as usize * height as usize * Self::CHANNELS).then_some(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The (B, G, R) triple at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Flat (B, G, R) samples.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

/// Decodes the texels of `region` into a [`PixelBuffer`].
///
/// Row `y` starts `y * (row_pitch / 4)` float components into the region
/// (integer division, so a row pitch that is not a multiple of four bytes
/// truncates). Texel `x` of a row starts `x * channel_count` components after
/// the row start.
pub fn decode(
    region: &MappedRegion<'_>,
    desc: &ResourceDesc,
    channel_count: u32,
    kind: TextureKind,
) -> Result<PixelBuffer, DecodeError> {
    let extent = desc
        .texture_extent()
        .ok_or(DecodeError::UnsupportedFormat {
            format: Format::Unknown,
            channels: channel_count,
            kind: kind.name(),
        })?;
    if channel_count != kind.channel_count() {
        return Err(DecodeError::UnsupportedFormat {
            format: extent.format,
            channels: channel_count,
            kind: kind.name(),
        });
    }

    let width = extent.width as usize;
    let height = extent.height as usize;
    let channels = channel_count as usize;
    let row_stride = region.row_pitch as usize / COMPONENT_SIZE;

    if width > 0 && height > 0 {
        let needed = (height - 1)
            .checked_mul(row_stride)
            .and_then(|rows| rows.checked_add(width.checked_mul(channels)?))
            .and_then(|components| components.checked_mul(COMPONENT_SIZE))
            .unwrap_or(usize::MAX);
        if region.data.len() < needed {
            return Err(DecodeError::RegionTooSmall {
                needed,
                actual: region.data.len(),
            });
        }
    }

    let read = |component: usize| -> f32 {
        let offset = component * COMPONENT_SIZE;
        bytemuck::pod_read_unaligned(&region.data[offset..offset + COMPONENT_SIZE])
    };

    let mut data = Vec::with_capacity(width * height * PixelBuffer::CHANNELS);
    for y in 0..height {
        let origin = y * row_stride;
        for x in 0..width {
            let src = origin + x * channels;
            match kind {
                TextureKind::Depth => {
                    let depth = read(src);
                    data.extend_from_slice(&[depth, depth, depth]);
                }
                TextureKind::Normal => {
                    data.extend_from_slice(&[read(src), read(src + 1), read(src + 2)]);
                }
                TextureKind::PackedDepth => {
                    data.extend_from_slice(&[read(src + 2), read(src + 1), read(src)]);
                }
            }
        }
    }

    Ok(PixelBuffer {
        width: extent.width,
        height: extent.height,
        data,
    })
}
