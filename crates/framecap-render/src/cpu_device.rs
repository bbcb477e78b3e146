//! A [`RenderDevice`] backed by host memory.
//!
//! Resources are plain byte vectors. Copies are queued and only land when
//! [`RenderDevice::wait_idle`] runs, like on a real device, and device-local
//! textures refuse to map. Every call made through the trait is recorded so
//! callers can inspect the exact sequence a readback issued.

use std::collections::HashMap;

use framecap_core::{
    align_pitch, row_pitch, DeviceApi, DeviceCaps, ResourceDesc, ResourceDimension,
    ResourceHandle, ResourceUsage, ResourceView,
};

use crate::device::{MappedRegion, RenderDevice};

/// A call made through the [`RenderDevice`] trait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    CreateBuffer(ResourceHandle),
    CreateTexture(ResourceHandle),
    Destroy(ResourceHandle),
    DestroyView(ResourceView),
    Barrier(ResourceHandle, ResourceUsage, ResourceUsage),
    CopyTextureToBuffer(ResourceHandle, ResourceHandle),
    CopyTextureRegion(ResourceHandle, ResourceHandle),
    WaitIdle,
    MapBuffer(ResourceHandle),
    MapTexture(ResourceHandle),
    UnmapBuffer(ResourceHandle),
    UnmapTexture(ResourceHandle),
}

#[derive(Debug)]
struct CpuResource {
    desc: ResourceDesc,
    data: Vec<u8>,
    /// Row pitch of texture storage. Zero for buffers.
    row_pitch: u32,
    state: ResourceUsage,
    mapped: bool,
}

#[derive(Debug, Clone, Copy)]
enum PendingCopy {
    TextureToBuffer { src: ResourceHandle, dst: ResourceHandle },
    TextureToTexture { src: ResourceHandle, dst: ResourceHandle },
}

/// Host-memory device.
#[derive(Debug)]
pub struct CpuDevice {
    api: DeviceApi,
    buffer_copies: bool,
    fail_creation: bool,
    texture_row_alignment: u32,
    next_handle: u64,
    resources: HashMap<ResourceHandle, CpuResource>,
    views: HashMap<ResourceView, ResourceHandle>,
    pending: Vec<PendingCopy>,
    created: Vec<ResourceDesc>,
    calls: Vec<DeviceCall>,
}

impl CpuDevice {
    /// Creates a device reporting `api`, with texture-to-buffer copies supported.
    pub fn new(api: DeviceApi) -> Self {
        Self {
            api,
            buffer_copies: true,
            fail_creation: false,
            texture_row_alignment: 1,
            next_handle: 1,
            resources: HashMap::new(),
            views: HashMap::new(),
            pending: Vec::new(),
            created: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Reports [`DeviceCaps::CopyBufferToTexture`] as unsupported.
    #[must_use]
    pub fn without_buffer_copies(mut self) -> Self {
        self.buffer_copies = false;
        self
    }

    /// Makes every [`RenderDevice::create_resource`] call fail.
    #[must_use]
    pub fn failing_resource_creation(mut self) -> Self {
        self.fail_creation = true;
        self
    }

    /// Pads texture rows to `alignment` bytes, as drivers do for mapped textures.
    #[must_use]
    pub fn with_texture_row_alignment(mut self, alignment: u32) -> Self {
        self.texture_row_alignment = alignment.max(1);
        self
    }

    /// Creates a texture on behalf of the host, filled from tightly packed rows.
    ///
    /// Host-side creation is not recorded as a device call.
    pub fn create_texture_with_data(
        &mut self,
        desc: &ResourceDesc,
        texels: &[u8],
    ) -> ResourceHandle {
        let handle = self.allocate(desc);
        let extent = desc.texture_extent();
        if let (Some(extent), Some(resource)) = (extent, self.resources.get_mut(&handle)) {
            let packed = row_pitch(extent.format, extent.width) as usize;
            let pitch = resource.row_pitch as usize;
            let rows = texels.chunks(packed.max(1)).take(extent.height as usize);
            for (y, row) in rows.enumerate() {
                let start = y * pitch;
                resource.data[start..start + row.len()].copy_from_slice(row);
            }
        }
        handle
    }

    /// Creates a shader resource view of `resource` on behalf of the host.
    pub fn create_view(&mut self, resource: ResourceHandle) -> ResourceView {
        let view = ResourceView(self.next_handle);
        self.next_handle += 1;
        self.views.insert(view, resource);
        view
    }

    /// Descriptors passed to [`RenderDevice::create_resource`], in call order.
    pub fn created_resources(&self) -> &[ResourceDesc] {
        &self.created
    }

    /// All trait calls, in order.
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Returns true if `resource` has not been destroyed.
    pub fn is_alive(&self, resource: ResourceHandle) -> bool {
        self.resources.contains_key(&resource)
    }

    /// Returns true if `view` has not been destroyed.
    pub fn is_view_alive(&self, view: ResourceView) -> bool {
        self.views.contains_key(&view)
    }

    /// Number of resources currently mapped.
    pub fn outstanding_maps(&self) -> usize {
        self.resources.values().filter(|r| r.mapped).count()
    }

    fn texture_pitch(&self, desc: &ResourceDesc) -> u32 {
        desc.texture_extent().map_or(0, |extent| {
            let pitch = align_pitch(
                row_pitch(extent.format, extent.width),
                self.texture_row_alignment,
            );
            u32::try_from(pitch).unwrap_or(0)
        })
    }

    fn allocate(&mut self, desc: &ResourceDesc) -> ResourceHandle {
        let handle = ResourceHandle(self.next_handle);
        self.next_handle += 1;

        let pitch = self.texture_pitch(desc);
        let size = match desc.dimension {
            ResourceDimension::Buffer { size } => usize::try_from(size).unwrap_or(0),
            ResourceDimension::Texture2D(extent) => {
                usize::try_from(u64::from(pitch) * u64::from(extent.height)).unwrap_or(0)
            }
        };
        self.resources.insert(
            handle,
            CpuResource {
                desc: *desc,
                data: vec![0; size],
                row_pitch: pitch,
                state: ResourceUsage::SHADER_RESOURCE,
                mapped: false,
            },
        );
        handle
    }

    fn execute(&mut self, copy: PendingCopy) {
        let (src, dst) = match copy {
            PendingCopy::TextureToBuffer { src, dst }
            | PendingCopy::TextureToTexture { src, dst } => (src, dst),
        };
        let Some(source) = self.resources.get(&src) else {
            log::warn!("copy from destroyed resource {src:?} skipped");
            return;
        };
        let Some(extent) = source.desc.texture_extent() else {
            return;
        };
        let packed = row_pitch(extent.format, extent.width) as usize;
        let src_pitch = source.row_pitch as usize;
        let rows: Vec<Vec<u8>> = (0..extent.height as usize)
            .map(|y| source.data[y * src_pitch..y * src_pitch + packed].to_vec())
            .collect();

        let dst_pitch = match copy {
            PendingCopy::TextureToBuffer { .. } => align_pitch(
                row_pitch(extent.format, extent.width),
                self.buffer_row_alignment(),
            ),
            PendingCopy::TextureToTexture { .. } => {
                self.resources.get(&dst).map_or(0, |r| u64::from(r.row_pitch))
            }
        };
        let dst_pitch = dst_pitch as usize;

        let Some(target) = self.resources.get_mut(&dst) else {
            log::warn!("copy into destroyed resource {dst:?} skipped");
            return;
        };
        for (y, row) in rows.iter().enumerate() {
            let start = y * dst_pitch;
            let end = (start + row.len()).min(target.data.len());
            if start >= end {
                break;
            }
            target.data[start..end].copy_from_slice(&row[..end - start]);
        }
    }
}

impl RenderDevice for CpuDevice {
    fn api(&self) -> DeviceApi {
        self.api
    }

    fn check_capability(&self, capability: DeviceCaps) -> bool {
        matches!(capability, DeviceCaps::CopyBufferToTexture) && self.buffer_copies
    }

    fn resource_desc(&self, resource: ResourceHandle) -> Option<ResourceDesc> {
        self.resources.get(&resource).map(|r| r.desc)
    }

    fn resource_from_view(&self, view: ResourceView) -> Option<ResourceHandle> {
        self.views.get(&view).copied()
    }

    fn create_resource(
        &mut self,
        desc: &ResourceDesc,
        initial_state: ResourceUsage,
    ) -> Option<ResourceHandle> {
        if self.fail_creation {
            return None;
        }
        let handle = self.allocate(desc);
        if let Some(resource) = self.resources.get_mut(&handle) {
            resource.state = initial_state;
        }
        self.created.push(*desc);
        self.calls.push(if desc.is_buffer() {
            DeviceCall::CreateBuffer(handle)
        } else {
            DeviceCall::CreateTexture(handle)
        });
        Some(handle)
    }

    fn destroy_resource(&mut self, resource: ResourceHandle) {
        self.calls.push(DeviceCall::Destroy(resource));
        if let Some(r) = self.resources.remove(&resource) {
            if r.mapped {
                log::error!("resource {resource:?} destroyed while mapped");
            }
        }
    }

    fn destroy_resource_view(&mut self, view: ResourceView) {
        self.calls.push(DeviceCall::DestroyView(view));
        self.views.remove(&view);
    }

    fn barrier(
        &mut self,
        resource: ResourceHandle,
        old_state: ResourceUsage,
        new_state: ResourceUsage,
    ) {
        self.calls.push(DeviceCall::Barrier(resource, old_state, new_state));
        if let Some(r) = self.resources.get_mut(&resource) {
            r.state = new_state;
        }
    }

    fn copy_texture_to_buffer(
        &mut self,
        src: ResourceHandle,
        dst: ResourceHandle,
        _row_length: u32,
        _slice_height: u32,
    ) {
        self.calls.push(DeviceCall::CopyTextureToBuffer(src, dst));
        if self
            .resources
            .get(&src)
            .is_some_and(|r| !r.state.contains(ResourceUsage::COPY_SOURCE))
        {
            log::warn!("copy from {src:?} recorded outside copy-source state");
        }
        self.pending.push(PendingCopy::TextureToBuffer { src, dst });
    }

    fn copy_texture_region(&mut self, src: ResourceHandle, dst: ResourceHandle) {
        self.calls.push(DeviceCall::CopyTextureRegion(src, dst));
        self.pending.push(PendingCopy::TextureToTexture { src, dst });
    }

    fn wait_idle(&mut self) {
        self.calls.push(DeviceCall::WaitIdle);
        for copy in std::mem::take(&mut self.pending) {
            self.execute(copy);
        }
    }

    fn map_buffer_region(&mut self, resource: ResourceHandle) -> Option<&[u8]> {
        self.calls.push(DeviceCall::MapBuffer(resource));
        let r = self.resources.get_mut(&resource)?;
        if !r.desc.is_buffer() || r.desc.heap.is_device_local() {
            return None;
        }
        r.mapped = true;
        Some(&r.data)
    }

    fn map_texture_region(&mut self, resource: ResourceHandle) -> Option<MappedRegion<'_>> {
        self.calls.push(DeviceCall::MapTexture(resource));
        let r = self.resources.get_mut(&resource)?;
        let extent = r.desc.texture_extent()?;
        if r.desc.heap.is_device_local() {
            return None;
        }
        r.mapped = true;
        Some(MappedRegion {
            data: &r.data,
            row_pitch: r.row_pitch,
            slice_pitch: u64::from(r.row_pitch) * u64::from(extent.height),
        })
    }

    fn unmap_buffer_region(&mut self, resource: ResourceHandle) {
        self.calls.push(DeviceCall::UnmapBuffer(resource));
        if let Some(r) = self.resources.get_mut(&resource) {
            r.mapped = false;
        }
    }

    fn unmap_texture_region(&mut self, resource: ResourceHandle) {
        self.calls.push(DeviceCall::UnmapTexture(resource));
        if let Some(r) = self.resources.get_mut(&resource) {
            r.mapped = false;
        }
    }
}
