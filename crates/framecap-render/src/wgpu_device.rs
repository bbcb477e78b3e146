//! A [`RenderDevice`] on top of a wgpu device and queue.
//!
//! wgpu tracks resource states itself and cannot map textures, so barriers
//! are no-ops, every imported texture reports [`MemoryHeap::GpuOnly`], and
//! readbacks always go through a buffer copy. Buffer rows are padded to
//! [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`].
//!
//! A mapped buffer is exposed as a host copy of its mapped range; the wgpu
//! mapping itself is released when [`RenderDevice::unmap_buffer_region`] runs.

use std::collections::HashMap;

use framecap_core::{
    align_row_pitch, row_pitch, DeviceApi, DeviceCaps, Format, MemoryHeap, ResourceDesc,
    ResourceDimension, ResourceHandle, ResourceUsage, ResourceView,
};

use crate::device::{MappedRegion, RenderDevice};

enum WgpuResource {
    Texture {
        texture: wgpu::Texture,
        desc: ResourceDesc,
    },
    Buffer {
        buffer: wgpu::Buffer,
        desc: ResourceDesc,
        host: Option<Vec<u8>>,
    },
}

impl WgpuResource {
    fn desc(&self) -> ResourceDesc {
        match self {
            Self::Texture { desc, .. } | Self::Buffer { desc, .. } => *desc,
        }
    }
}

/// Maps a wgpu texture format to the readback [`Format`].
///
/// Formats wgpu cannot copy into a buffer map to [`Format::Unknown`].
pub fn format_from_wgpu(format: wgpu::TextureFormat) -> Format {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Format::R8G8B8A8Unorm,
        wgpu::TextureFormat::Bgra8Unorm => Format::B8G8R8A8Unorm,
        wgpu::TextureFormat::R16Float => Format::R16Float,
        wgpu::TextureFormat::Rgba16Float => Format::R16G16B16A16Float,
        wgpu::TextureFormat::R32Float => Format::R32Float,
        wgpu::TextureFormat::Rgba32Float => Format::R32G32B32A32Float,
        wgpu::TextureFormat::Depth32Float => Format::D32Float,
        // Only the depth aspect is copied out, as tightly packed f32.
        wgpu::TextureFormat::Depth32FloatStencil8 => Format::D32Float,
        _ => Format::Unknown,
    }
}

/// Maps a readback [`Format`] to a wgpu texture format. Typeless formats
/// have no wgpu counterpart.
pub fn format_to_wgpu(format: Format) -> Option<wgpu::TextureFormat> {
    Some(match format {
        Format::R8G8B8A8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        Format::B8G8R8A8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        Format::R16Float => wgpu::TextureFormat::R16Float,
        Format::R16G16B16A16Float => wgpu::TextureFormat::Rgba16Float,
        Format::R32Float => wgpu::TextureFormat::R32Float,
        Format::R32G32B32A32Float => wgpu::TextureFormat::Rgba32Float,
        Format::D32Float => wgpu::TextureFormat::Depth32Float,
        _ => return None,
    })
}

fn usage_from_wgpu(usage: wgpu::TextureUsages, format: Format) -> ResourceUsage {
    let mut out = ResourceUsage::empty();
    if usage.contains(wgpu::TextureUsages::TEXTURE_BINDING) {
        out |= ResourceUsage::SHADER_RESOURCE;
    }
    if usage.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) {
        out |= if format.is_depth_stencil() {
            ResourceUsage::DEPTH_STENCIL
        } else {
            ResourceUsage::RENDER_TARGET
        };
    }
    if usage.contains(wgpu::TextureUsages::COPY_SRC) {
        out |= ResourceUsage::COPY_SOURCE;
    }
    if usage.contains(wgpu::TextureUsages::COPY_DST) {
        out |= ResourceUsage::COPY_DEST;
    }
    out
}

fn aspect_for(format: Format) -> wgpu::TextureAspect {
    if format.is_depth_stencil() {
        wgpu::TextureAspect::DepthOnly
    } else {
        wgpu::TextureAspect::All
    }
}

/// wgpu-backed device.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    resources: HashMap<ResourceHandle, WgpuResource>,
    views: HashMap<ResourceView, (ResourceHandle, wgpu::TextureView)>,
    encoder: Option<wgpu::CommandEncoder>,
    next_handle: u64,
}

impl WgpuDevice {
    /// Wraps an existing device and its queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            resources: HashMap::new(),
            views: HashMap::new(),
            encoder: None,
            next_handle: 1,
        }
    }

    /// Returns the wgpu device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns the wgpu queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn allocate(&mut self) -> ResourceHandle {
        let handle = ResourceHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Registers a host texture so it can be read back.
    pub fn import_texture(&mut self, texture: wgpu::Texture) -> ResourceHandle {
        let format = format_from_wgpu(texture.format());
        let desc = ResourceDesc::texture(
            texture.width(),
            texture.height(),
            format,
            MemoryHeap::GpuOnly,
            usage_from_wgpu(texture.usage(), format),
        );
        let handle = self.allocate();
        self.resources
            .insert(handle, WgpuResource::Texture { texture, desc });
        handle
    }

    /// Creates a default view onto an imported texture.
    pub fn create_view(&mut self, resource: ResourceHandle) -> Option<ResourceView> {
        let Some(WgpuResource::Texture { texture, .. }) = self.resources.get(&resource) else {
            return None;
        };
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let handle = ResourceView(self.next_handle);
        self.next_handle += 1;
        self.views.insert(handle, (resource, view));
        Some(handle)
    }

    fn take_encoder(&mut self) -> wgpu::CommandEncoder {
        self.encoder.take().unwrap_or_else(|| {
            self.device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("framecap readback encoder"),
                })
        })
    }

    fn texture(&self, resource: ResourceHandle) -> Option<(&wgpu::Texture, ResourceDesc)> {
        match self.resources.get(&resource)? {
            WgpuResource::Texture { texture, desc } => Some((texture, *desc)),
            WgpuResource::Buffer { .. } => None,
        }
    }
}

impl RenderDevice for WgpuDevice {
    // Only consulted for the default row alignment, which is overridden below.
    fn api(&self) -> DeviceApi {
        DeviceApi::Vulkan
    }

    fn check_capability(&self, capability: DeviceCaps) -> bool {
        matches!(capability, DeviceCaps::CopyBufferToTexture)
    }

    fn buffer_row_alignment(&self) -> u32 {
        wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
    }

    fn resource_desc(&self, resource: ResourceHandle) -> Option<ResourceDesc> {
        self.resources.get(&resource).map(WgpuResource::desc)
    }

    fn resource_from_view(&self, view: ResourceView) -> Option<ResourceHandle> {
        self.views.get(&view).map(|(resource, _)| *resource)
    }

    fn create_resource(
        &mut self,
        desc: &ResourceDesc,
        _initial_state: ResourceUsage,
    ) -> Option<ResourceHandle> {
        let resource = match desc.dimension {
            ResourceDimension::Buffer { size } => {
                let mut usage = wgpu::BufferUsages::COPY_DST;
                if desc.heap == MemoryHeap::GpuToCpu {
                    usage |= wgpu::BufferUsages::MAP_READ;
                }
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("framecap readback buffer"),
                    size,
                    usage,
                    mapped_at_creation: false,
                });
                WgpuResource::Buffer {
                    buffer,
                    desc: *desc,
                    host: None,
                }
            }
            ResourceDimension::Texture2D(extent) => {
                let format = format_to_wgpu(extent.format)?;
                let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("framecap readback texture"),
                    size: wgpu::Extent3d {
                        width: extent.width,
                        height: extent.height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                WgpuResource::Texture {
                    texture,
                    desc: *desc,
                }
            }
        };
        let handle = self.allocate();
        self.resources.insert(handle, resource);
        Some(handle)
    }

    fn destroy_resource(&mut self, resource: ResourceHandle) {
        match self.resources.remove(&resource) {
            Some(WgpuResource::Texture { texture, .. }) => texture.destroy(),
            Some(WgpuResource::Buffer { buffer, host, .. }) => {
                if host.is_some() {
                    log::error!("Destroying buffer {resource:?} while it is mapped");
                    buffer.unmap();
                }
                buffer.destroy();
            }
            None => log::warn!("Destroying unknown resource {resource:?}"),
        }
    }

    fn destroy_resource_view(&mut self, view: ResourceView) {
        self.views.remove(&view);
    }

    fn barrier(&mut self, _resource: ResourceHandle, _old: ResourceUsage, _new: ResourceUsage) {}

    fn copy_texture_to_buffer(
        &mut self,
        src: ResourceHandle,
        dst: ResourceHandle,
        row_length: u32,
        slice_height: u32,
    ) {
        let mut encoder = self.take_encoder();
        let Some((texture, desc)) = self.texture(src) else {
            log::error!("Copy source {src:?} is not a texture");
            self.encoder = Some(encoder);
            return;
        };
        let Some(WgpuResource::Buffer { buffer, .. }) = self.resources.get(&dst) else {
            log::error!("Copy destination {dst:?} is not a buffer");
            self.encoder = Some(encoder);
            return;
        };
        let format = desc.texture_extent().map_or(Format::Unknown, |e| e.format);
        let bytes_per_row = u32::try_from(align_row_pitch(row_pitch(format, row_length)))
            .ok()
            .filter(|&pitch| pitch > 0);
        let Some(bytes_per_row) = bytes_per_row else {
            log::error!("Cannot copy {format} texture {src:?} into a buffer");
            self.encoder = Some(encoder);
            return;
        };

        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: aspect_for(format),
            },
            wgpu::TexelCopyBufferInfo {
                buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(slice_height),
                },
            },
            wgpu::Extent3d {
                width: row_length,
                height: slice_height,
                depth_or_array_layers: 1,
            },
        );
        self.encoder = Some(encoder);
    }

    fn copy_texture_region(&mut self, src: ResourceHandle, dst: ResourceHandle) {
        let mut encoder = self.take_encoder();
        let (Some((src_texture, desc)), Some((dst_texture, _))) =
            (self.texture(src), self.texture(dst))
        else {
            log::error!("Texture copy {src:?} -> {dst:?} needs two textures");
            self.encoder = Some(encoder);
            return;
        };
        let Some(extent) = desc.texture_extent() else {
            self.encoder = Some(encoder);
            return;
        };
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: src_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: aspect_for(extent.format),
            },
            wgpu::TexelCopyTextureInfo {
                texture: dst_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: aspect_for(extent.format),
            },
            wgpu::Extent3d {
                width: extent.width,
                height: extent.height,
                depth_or_array_layers: 1,
            },
        );
        self.encoder = Some(encoder);
    }

    fn wait_idle(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        let _ = self.device.poll(wgpu::Maintain::Wait);
    }

    fn map_buffer_region(&mut self, resource: ResourceHandle) -> Option<&[u8]> {
        let Some(WgpuResource::Buffer { buffer, host, .. }) = self.resources.get_mut(&resource)
        else {
            return None;
        };

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                log::error!("Failed to map buffer {resource:?}: {err}");
                return None;
            }
            Err(_) => {
                log::error!("Buffer {resource:?} mapping callback never ran");
                return None;
            }
        }

        *host = Some(slice.get_mapped_range().to_vec());
        host.as_deref()
    }

    fn map_texture_region(&mut self, _resource: ResourceHandle) -> Option<MappedRegion<'_>> {
        None
    }

    fn unmap_buffer_region(&mut self, resource: ResourceHandle) {
        if let Some(WgpuResource::Buffer { buffer, host, .. }) = self.resources.get_mut(&resource) {
            if host.take().is_some() {
                buffer.unmap();
            }
        }
    }

    fn unmap_texture_region(&mut self, _resource: ResourceHandle) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readback::{Readback, TransferStrategy};

    fn headless() -> Option<WgpuDevice> {
        pollster::block_on(async {
            let instance = wgpu::Instance::default();
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await?;
            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor::default(), None)
                .await
                .ok()?;
            Some(WgpuDevice::new(device, queue))
        })
    }

    #[test]
    fn test_format_mapping() {
        assert_eq!(format_from_wgpu(wgpu::TextureFormat::R32Float), Format::R32Float);
        assert_eq!(
            format_to_wgpu(Format::R32G32B32A32Float),
            Some(wgpu::TextureFormat::Rgba32Float)
        );
        assert_eq!(format_to_wgpu(Format::R32Typeless), None);
        assert_eq!(format_from_wgpu(wgpu::TextureFormat::Rg8Unorm), Format::Unknown);
    }

    #[test]
    fn test_uncopyable_depth_formats() {
        assert_eq!(
            format_from_wgpu(wgpu::TextureFormat::Depth24PlusStencil8),
            Format::Unknown
        );
        assert_eq!(format_from_wgpu(wgpu::TextureFormat::Depth24Plus), Format::Unknown);
        assert_eq!(
            format_from_wgpu(wgpu::TextureFormat::Depth32FloatStencil8),
            Format::D32Float
        );
        assert_eq!(format_to_wgpu(Format::D24UnormS8Uint), None);
    }

    #[test]
    fn test_usage_mapping() {
        let usage = usage_from_wgpu(
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            Format::D32Float,
        );
        assert!(usage.contains(ResourceUsage::SHADER_RESOURCE | ResourceUsage::COPY_SOURCE));
        assert!(usage.contains(ResourceUsage::DEPTH_STENCIL));
        assert!(!usage.contains(ResourceUsage::RENDER_TARGET));
    }

    #[test]
    fn test_readback_of_imported_texture() {
        let Some(mut device) = headless() else {
            eprintln!("no wgpu adapter available, skipping");
            return;
        };

        let texture = device.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("depth export"),
            size: wgpu::Extent3d {
                width: 3,
                height: 2,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let texels: Vec<f32> = (0..6u8).map(f32::from).collect();
        device.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(12),
                rows_per_image: Some(2),
            },
            wgpu::Extent3d {
                width: 3,
                height: 2,
                depth_or_array_layers: 1,
            },
        );

        let source = device.import_texture(texture);
        let view = device.create_view(source).unwrap();
        assert_eq!(device.resource_from_view(view), Some(source));
        let desc = device.resource_desc(source).unwrap();
        assert_eq!(desc.heap, MemoryHeap::GpuOnly);

        let staging;
        {
            let mut readback = Readback::begin(&mut device, source, &desc).unwrap();
            assert_eq!(readback.strategy(), TransferStrategy::BufferCopy);
            staging = readback.intermediate();
            let region = readback.map().unwrap();
            assert_eq!(region.row_pitch, 256);
            let first_of_row_1: f32 = bytemuck::pod_read_unaligned(&region.data[256..260]);
            assert_eq!(first_of_row_1, 3.0);
        }
        assert!(device.resource_desc(staging).is_none());
    }
}
