//! One texture export: readback, decode, EXR write.

use std::path::Path;

use framecap_core::{BoundTexture, Format};

use crate::decode::{decode, TextureKind};
use crate::device::RenderDevice;
use crate::error::{DecodeError, ExportError};
use crate::hdr::{write_exr, SamplePrecision};
use crate::readback::Readback;

/// Float channels per texel the decoder reads for `format`, if it has a
/// float decoder at all.
pub fn channel_count_for(format: Format) -> Option<u32> {
    format.float_channel_count()
}

/// Reads `texture` back from `device` and writes it to `path` as an EXR.
///
/// The intermediate resource and mapping are released before returning,
/// whether or not the export succeeded.
pub fn export_texture<D: RenderDevice + ?Sized>(
    device: &mut D,
    texture: &BoundTexture,
    kind: TextureKind,
    path: &Path,
    precision: SamplePrecision,
) -> Result<(), ExportError> {
    let desc = texture.desc;
    let format = desc.texture_extent().map_or(Format::Unknown, |e| e.format);
    let channels = channel_count_for(format).unwrap_or(0);
    if channels != kind.channel_count() {
        return Err(DecodeError::UnsupportedFormat {
            format,
            channels,
            kind: kind.name(),
        }
        .into());
    }

    let pixels = {
        let mut readback = Readback::begin(device, texture.resource, &desc)?;
        log::debug!(
            "Reading back {} texture {:?} via {:?}",
            kind,
            texture.resource,
            readback.strategy()
        );
        let region = readback.map()?;
        decode(&region, &desc, channels, kind)?
    };

    write_exr(path, &pixels, precision)?;
    log::info!("Saved {} texture to {}", kind, path.display());
    Ok(())
}
