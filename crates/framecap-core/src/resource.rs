//! Handles and descriptors for device resources.
//!
//! Handles are opaque values owned by the host device. Descriptors are
//! immutable snapshots queried from the device; they are copied freely and
//! never updated in place.

use bitflags::bitflags;

use crate::format::Format;

/// Opaque handle to a device resource (buffer or texture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(pub u64);

impl ResourceHandle {
    /// The null handle.
    pub const NULL: Self = Self(0);

    /// Returns true for the null handle.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Opaque handle to a view onto a device resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceView(pub u64);

impl ResourceView {
    /// The null view.
    pub const NULL: Self = Self(0);

    /// Returns true for the null view.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Graphics API family of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceApi {
    D3D9,
    D3D10,
    D3D11,
    D3D12,
    OpenGL,
    Vulkan,
}

impl DeviceApi {
    /// Whether texture-to-buffer copies need rows padded to
    /// [`ROW_PITCH_ALIGNMENT`](crate::format::ROW_PITCH_ALIGNMENT).
    #[must_use]
    pub const fn requires_row_alignment(self) -> bool {
        matches!(self, Self::D3D12)
    }

    /// Buffer row alignment in bytes for texture-to-buffer copies (1 = none).
    #[must_use]
    pub const fn buffer_row_alignment(self) -> u32 {
        if self.requires_row_alignment() {
            crate::format::ROW_PITCH_ALIGNMENT
        } else {
            1
        }
    }
}

/// Optional device capabilities queried before choosing a copy path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DeviceCaps {
    /// Textures can be copied into buffers (and back).
    CopyBufferToTexture,
}

/// Memory heap backing a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryHeap {
    /// Heap not reported by the host.
    #[default]
    Unknown,
    /// Device-local memory that the CPU cannot map.
    GpuOnly,
    /// Upload heap.
    CpuToGpu,
    /// Readback heap.
    GpuToCpu,
    /// System memory.
    CpuOnly,
}

impl MemoryHeap {
    /// Returns true if the CPU cannot map this heap and a copy is required.
    #[must_use]
    pub const fn is_device_local(self) -> bool {
        matches!(self, Self::GpuOnly)
    }
}

bitflags! {
    /// Usage roles and resource states.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceUsage: u32 {
        const SHADER_RESOURCE = 1 << 0;
        const RENDER_TARGET = 1 << 1;
        const DEPTH_STENCIL = 1 << 2;
        const COPY_SOURCE = 1 << 3;
        const COPY_DEST = 1 << 4;
    }
}

/// Size and format of a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureExtent {
    pub width: u32,
    pub height: u32,
    pub format: Format,
}

/// Shape of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceDimension {
    Buffer { size: u64 },
    Texture2D(TextureExtent),
}

/// Descriptor of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceDesc {
    pub dimension: ResourceDimension,
    pub heap: MemoryHeap,
    pub usage: ResourceUsage,
}

impl ResourceDesc {
    /// Describes a buffer of `size` bytes.
    pub const fn buffer(size: u64, heap: MemoryHeap, usage: ResourceUsage) -> Self {
        Self {
            dimension: ResourceDimension::Buffer { size },
            heap,
            usage,
        }
    }

    /// Describes a single-mip, single-layer 2D texture.
    pub const fn texture(
        width: u32,
        height: u32,
        format: Format,
        heap: MemoryHeap,
        usage: ResourceUsage,
    ) -> Self {
        Self {
            dimension: ResourceDimension::Texture2D(TextureExtent {
                width,
                height,
                format,
            }),
            heap,
            usage,
        }
    }

    /// Returns the texture extent, or `None` for buffers.
    pub const fn texture_extent(&self) -> Option<TextureExtent> {
        match self.dimension {
            ResourceDimension::Texture2D(extent) => Some(extent),
            ResourceDimension::Buffer { .. } => None,
        }
    }

    /// Returns true if this describes a buffer.
    pub const fn is_buffer(&self) -> bool {
        matches!(self.dimension, ResourceDimension::Buffer { .. })
    }

    /// Returns true if every flag in `usage` is set on the resource.
    pub fn has_usage(&self, usage: ResourceUsage) -> bool {
        self.usage.contains(usage)
    }
}
