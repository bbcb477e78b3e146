//! Device capability interface consumed by the readback pipeline.
//!
//! The host owns the real device; the pipeline only needs resource queries,
//! resource creation, copies, barriers, a full idle wait, and read-only
//! mapping. Methods mirror the primitives graphics hosts expose to add-ons so
//! an adapter is a thin forwarding layer.

use framecap_core::{
    DeviceApi, DeviceCaps, ResourceDesc, ResourceHandle, ResourceUsage, ResourceView,
};

/// Host-visible memory holding the texels of one mapped subresource.
///
/// The borrow ties the region to the mapping call, so the resource cannot be
/// unmapped or destroyed while the region is alive.
#[derive(Debug, Clone, Copy)]
pub struct MappedRegion<'a> {
    /// Raw bytes, starting at texel (0, 0).
    pub data: &'a [u8],
    /// Bytes between the starts of consecutive rows.
    pub row_pitch: u32,
    /// Bytes between the starts of consecutive 2D planes.
    pub slice_pitch: u64,
}

/// Primitives a device must provide for texture readback.
pub trait RenderDevice {
    /// Graphics API family of the device.
    fn api(&self) -> DeviceApi;

    /// Returns whether an optional capability is supported.
    fn check_capability(&self, capability: DeviceCaps) -> bool;

    /// Row alignment in bytes applied to texture-to-buffer copies.
    fn buffer_row_alignment(&self) -> u32 {
        self.api().buffer_row_alignment()
    }

    /// Returns the descriptor of a live resource.
    fn resource_desc(&self, resource: ResourceHandle) -> Option<ResourceDesc>;

    /// Returns the resource a view was created from.
    fn resource_from_view(&self, view: ResourceView) -> Option<ResourceHandle>;

    /// Creates a resource in `initial_state`. Returns `None` on failure.
    fn create_resource(
        &mut self,
        desc: &ResourceDesc,
        initial_state: ResourceUsage,
    ) -> Option<ResourceHandle>;

    /// Destroys a resource created by [`RenderDevice::create_resource`].
    fn destroy_resource(&mut self, resource: ResourceHandle);

    /// Destroys a resource view.
    fn destroy_resource_view(&mut self, view: ResourceView);

    /// Records a state transition of `resource`.
    fn barrier(
        &mut self,
        resource: ResourceHandle,
        old_state: ResourceUsage,
        new_state: ResourceUsage,
    );

    /// Records a copy of texture subresource 0 into `dst` at offset 0.
    ///
    /// Rows in the buffer are laid out with [`RenderDevice::buffer_row_alignment`].
    fn copy_texture_to_buffer(
        &mut self,
        src: ResourceHandle,
        dst: ResourceHandle,
        row_length: u32,
        slice_height: u32,
    );

    /// Records a full copy of texture subresource 0 into another texture.
    fn copy_texture_region(&mut self, src: ResourceHandle, dst: ResourceHandle);

    /// Submits recorded work and blocks until the device is idle.
    fn wait_idle(&mut self);

    /// Maps a whole buffer for reading.
    fn map_buffer_region(&mut self, resource: ResourceHandle) -> Option<&[u8]>;

    /// Maps texture subresource 0 for reading.
    fn map_texture_region(&mut self, resource: ResourceHandle) -> Option<MappedRegion<'_>>;

    /// Undoes [`RenderDevice::map_buffer_region`].
    fn unmap_buffer_region(&mut self, resource: ResourceHandle);

    /// Undoes [`RenderDevice::map_texture_region`].
    fn unmap_texture_region(&mut self, resource: ResourceHandle);
}
