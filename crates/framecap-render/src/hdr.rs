//! OpenEXR output for decoded pixel buffers.
//!
//! Files carry three channels named `B`, `G` and `R`, one scanline layer, and
//! PIZ compression.

use std::path::Path;

use exr::compression::Compression;
use exr::image::{Blocks, Encoding};
use exr::meta::attribute::LineOrder;
use exr::prelude::{
    AnyChannel, AnyChannels, FlatSamples, Image, Layer, LayerAttributes, SmallVec, Text, Vec2,
    WritableImage,
};

use crate::decode::PixelBuffer;
use crate::error::EncodeError;

/// Names of the channels written, in the order the pixel buffer stores them.
pub const CHANNEL_NAMES: [&str; 3] = ["B", "G", "R"];

/// Sample type stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplePrecision {
    /// 32-bit float samples.
    #[default]
    F32,
    /// 16-bit half-float samples.
    F16,
}

/// Writes `pixels` to `path` as an EXR image.
pub fn write_exr(
    path: &Path,
    pixels: &PixelBuffer,
    precision: SamplePrecision,
) -> Result<(), EncodeError> {
    encode_hdr(pixels.as_slice(), pixels.width(), pixels.height(), path, precision)
}

/// Writes `width * height` interleaved (B, G, R) float triples to `path`.
pub fn encode_hdr(
    data: &[f32],
    width: u32,
    height: u32,
    path: &Path,
    precision: SamplePrecision,
) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::EmptyImage { width, height });
    }
    let pixel_count = width as usize * height as usize;
    let expected = pixel_count * PixelBuffer::CHANNELS;
    if data.len() != expected {
        return Err(EncodeError::SizeMismatch {
            expected,
            actual: data.len(),
        });
    }

    let mut planes: [Vec<f32>; 3] = std::array::from_fn(|_| Vec::with_capacity(pixel_count));
    for px in data.chunks_exact(PixelBuffer::CHANNELS) {
        for (plane, &sample) in planes.iter_mut().zip(px) {
            plane.push(sample);
        }
    }

    let list: SmallVec<[AnyChannel<FlatSamples>; 4]> = CHANNEL_NAMES
        .iter()
        .zip(planes)
        .map(|(&name, plane)| AnyChannel {
            name: Text::from(name),
            sample_data: samples(plane, precision),
            quantize_linearly: false,
            sampling: Vec2(1, 1),
        })
        .collect();

    let encoding = Encoding {
        compression: Compression::PIZ,
        blocks: Blocks::ScanLines,
        line_order: LineOrder::Increasing,
    };
    let layer = Layer::new(
        (width as usize, height as usize),
        LayerAttributes::default(),
        encoding,
        AnyChannels::sort(list),
    );

    log::debug!(
        "Writing {}x{} {:?} EXR to {}",
        width,
        height,
        precision,
        path.display()
    );
    Image::from_layer(layer)
        .write()
        .to_file(path)
        .map_err(|source| EncodeError::Write {
            path: path.to_path_buf(),
            source,
        })
}

fn samples(plane: Vec<f32>, precision: SamplePrecision) -> FlatSamples {
    match precision {
        SamplePrecision::F32 => FlatSamples::F32(plane),
        SamplePrecision::F16 => {
            FlatSamples::F16(plane.into_iter().map(half::f16::from_f32).collect())
        }
    }
}
