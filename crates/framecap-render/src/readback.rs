//! Moving texture contents into CPU-addressable memory.
//!
//! [`Readback::begin`] picks one of three transfer strategies from the source
//! descriptor and the device capabilities, issues the copy, and waits for the
//! device to go idle. [`Readback::map`] then exposes the texels. Dropping the
//! [`Readback`] unmaps and releases the intermediate resource, in that order.

use framecap_core::{
    buffer_pitches_with_alignment, DeviceCaps, MemoryHeap, ResourceDesc, ResourceHandle,
    ResourceUsage,
};

use crate::device::{MappedRegion, RenderDevice};
use crate::error::{TransferError, TransferResult};

/// How texels travel from the source texture to host memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// The source lives in host-visible memory and is mapped in place.
    DirectMap,
    /// The source is copied into a host-visible buffer.
    BufferCopy,
    /// The source is copied into a host-visible texture.
    TextureCopy,
}

impl TransferStrategy {
    /// Selects the strategy for a source, in priority order.
    pub fn select<D: RenderDevice + ?Sized>(device: &D, desc: &ResourceDesc) -> Self {
        if !desc.heap.is_device_local() {
            Self::DirectMap
        } else if device.check_capability(DeviceCaps::CopyBufferToTexture) {
            Self::BufferCopy
        } else {
            Self::TextureCopy
        }
    }
}

/// An in-flight readback of one texture.
pub struct Readback<'d, D: RenderDevice + ?Sized> {
    device: &'d mut D,
    source: ResourceHandle,
    intermediate: ResourceHandle,
    strategy: TransferStrategy,
    /// Row and slice pitch of the staging buffer. Zero unless buffer copy.
    row_pitch: u32,
    slice_pitch: u64,
    mapped: bool,
}

impl<'d, D: RenderDevice + ?Sized> Readback<'d, D> {
    /// Makes the contents of `source` host-readable.
    ///
    /// `desc` is the caller's snapshot of the source descriptor. On return the
    /// copy (if any) has completed.
    pub fn begin(
        device: &'d mut D,
        source: ResourceHandle,
        desc: &ResourceDesc,
    ) -> TransferResult<Self> {
        if source.is_null() {
            return Err(TransferError::NotATexture(source));
        }
        let extent = desc
            .texture_extent()
            .ok_or(TransferError::NotATexture(source))?;

        let strategy = TransferStrategy::select(&*device, desc);
        let mut row_pitch = 0;
        let mut slice_pitch = 0;

        let intermediate = match strategy {
            TransferStrategy::DirectMap => source,
            TransferStrategy::BufferCopy => {
                if !desc.has_usage(ResourceUsage::COPY_SOURCE) {
                    return Err(TransferError::MissingCopySource(source));
                }

                let Some((row, slice)) = buffer_pitches_with_alignment(
                    device.buffer_row_alignment(),
                    extent.format,
                    extent.width,
                    extent.height,
                )
                .and_then(|(row, slice)| Some((u32::try_from(row).ok()?, slice))) else {
                    return Err(TransferError::PitchOverflow {
                        width: extent.width,
                        height: extent.height,
                        format: extent.format,
                    });
                };
                row_pitch = row;
                slice_pitch = slice;

                let staging_desc = ResourceDesc::buffer(
                    slice_pitch,
                    MemoryHeap::GpuToCpu,
                    ResourceUsage::COPY_DEST,
                );
                let Some(staging) = device.create_resource(&staging_desc, ResourceUsage::COPY_DEST)
                else {
                    log::error!("Failed to create system memory buffer for texture dumping");
                    return Err(TransferError::ResourceCreation("buffer"));
                };

                device.barrier(source, ResourceUsage::SHADER_RESOURCE, ResourceUsage::COPY_SOURCE);
                device.copy_texture_to_buffer(source, staging, extent.width, extent.height);
                device.barrier(source, ResourceUsage::COPY_SOURCE, ResourceUsage::SHADER_RESOURCE);
                staging
            }
            TransferStrategy::TextureCopy => {
                if !desc.has_usage(ResourceUsage::COPY_SOURCE) {
                    return Err(TransferError::MissingCopySource(source));
                }

                let staging_desc = ResourceDesc::texture(
                    extent.width,
                    extent.height,
                    extent.format.default_typed(),
                    MemoryHeap::GpuToCpu,
                    ResourceUsage::COPY_DEST,
                );
                let Some(staging) = device.create_resource(&staging_desc, ResourceUsage::COPY_DEST)
                else {
                    log::error!("Failed to create system memory texture for texture dumping");
                    return Err(TransferError::ResourceCreation("texture"));
                };

                device.barrier(source, ResourceUsage::SHADER_RESOURCE, ResourceUsage::COPY_SOURCE);
                device.copy_texture_region(source, staging);
                device.barrier(source, ResourceUsage::COPY_SOURCE, ResourceUsage::SHADER_RESOURCE);
                staging
            }
        };

        device.wait_idle();

        Ok(Self {
            device,
            source,
            intermediate,
            strategy,
            row_pitch,
            slice_pitch,
            mapped: false,
        })
    }

    /// The strategy chosen for this readback.
    pub fn strategy(&self) -> TransferStrategy {
        self.strategy
    }

    /// The resource that gets mapped. Equal to the source for direct maps.
    pub fn intermediate(&self) -> ResourceHandle {
        self.intermediate
    }

    /// Maps the transferred texels for reading.
    ///
    /// Buffer copies report the pitches the buffer was laid out with; texture
    /// mappings report whatever the device returns.
    pub fn map(&mut self) -> TransferResult<MappedRegion<'_>> {
        self.unmap();

        let resource = self.intermediate;
        match self.strategy {
            TransferStrategy::BufferCopy => {
                let data = self
                    .device
                    .map_buffer_region(resource)
                    .ok_or(TransferError::MapFailed(resource))?;
                self.mapped = true;
                Ok(MappedRegion {
                    data,
                    row_pitch: self.row_pitch,
                    slice_pitch: self.slice_pitch,
                })
            }
            TransferStrategy::DirectMap | TransferStrategy::TextureCopy => {
                let region = self
                    .device
                    .map_texture_region(resource)
                    .ok_or(TransferError::MapFailed(resource))?;
                self.mapped = true;
                Ok(region)
            }
        }
    }

    fn unmap(&mut self) {
        if !self.mapped {
            return;
        }
        match self.strategy {
            TransferStrategy::BufferCopy => self.device.unmap_buffer_region(self.intermediate),
            TransferStrategy::DirectMap | TransferStrategy::TextureCopy => {
                self.device.unmap_texture_region(self.intermediate);
            }
        }
        self.mapped = false;
    }
}

impl<D: RenderDevice + ?Sized> Drop for Readback<'_, D> {
    fn drop(&mut self) {
        self.unmap();
        if self.intermediate != self.source {
            self.device.destroy_resource(self.intermediate);
        }
    }
}
