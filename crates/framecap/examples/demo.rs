//! Demo showing one capture through a headless wgpu device.
//!
//! A synthetic depth ramp is uploaded to an `R32Float` texture and bound to
//! the export variable. One frame with the trigger key held writes
//! `<prefix> BackBuffer.bmp` and `<prefix> DepthBuffer.exr` into the
//! current directory.

use std::path::PathBuf;

use framecap::*;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 32;

struct HeadlessRuntime {
    device: WgpuDevice,
    export_view: ResourceView,
}

impl EffectRuntime for HeadlessRuntime {
    type Device = WgpuDevice;

    fn device_mut(&mut self) -> &mut WgpuDevice {
        &mut self.device
    }

    fn is_key_pressed(&self, key: u32) -> bool {
        key == TRIGGER_KEY
    }

    fn screenshot_size(&self) -> (u32, u32) {
        (WIDTH, HEIGHT)
    }

    fn capture_screenshot(&mut self, pixels: &mut [u8]) -> bool {
        for (i, px) in pixels.chunks_exact_mut(4).enumerate() {
            let x = (i as u32 % WIDTH * 255 / WIDTH) as u8;
            px.copy_from_slice(&[x, x, x, 255]);
        }
        true
    }

    fn enumerate_texture_variables(&self, callback: &mut dyn FnMut(TextureVariable)) {
        callback(TextureVariable(0));
    }

    fn texture_variable_name(&self, variable: TextureVariable) -> Option<String> {
        (variable.0 == 0).then(|| AddonProfile::FrameCapture.binding_name().to_owned())
    }

    fn texture_binding(&self, variable: TextureVariable) -> Option<ResourceView> {
        (variable.0 == 0).then_some(self.export_view)
    }

    fn executable_path(&self) -> PathBuf {
        PathBuf::from("demo")
    }
}

fn headless_device() -> Option<WgpuDevice> {
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

fn upload_depth_ramp(device: &mut WgpuDevice) -> Option<ResourceView> {
    let size = wgpu::Extent3d {
        width: WIDTH,
        height: HEIGHT,
        depth_or_array_layers: 1,
    };
    let texture = device.device().create_texture(&wgpu::TextureDescriptor {
        label: Some("depth ramp"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::R32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let texels: Vec<f32> = (0..WIDTH * HEIGHT)
        .map(|i| (i / WIDTH) as f32 / HEIGHT as f32)
        .collect();
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
            bytes_per_row: Some(WIDTH * 4),
            rows_per_image: Some(HEIGHT),
        },
        size,
    );

    let resource = device.import_texture(texture);
    device.create_view(resource)
}

fn main() -> Result<()> {
    init();

    let Some(mut device) = headless_device() else {
        log::error!("No wgpu adapter available");
        return Ok(());
    };
    let Some(export_view) = upload_depth_ramp(&mut device) else {
        log::error!("Failed to create a view of the depth texture");
        return Ok(());
    };
    let mut runtime = HeadlessRuntime {
        device,
        export_view,
    };

    let mut addon = Addon::new(AddonProfile::FrameCapture, MemoryConfigStore::new());
    addon.on_init_device();
    addon.update_settings(CaptureSettings {
        capture_enabled: true,
        export_depth: true,
        export_normal: false,
    })?;

    let mut state = addon.on_init_effect_runtime();
    addon.on_begin_effects(&mut runtime, &mut state);
    if let Some(report) = addon.on_present(&mut runtime, &state) {
        match &report.screenshot {
            Ok(path) => println!("screenshot: {}", path.display()),
            Err(e) => println!("screenshot failed: {e}"),
        }
        for (kind, path) in report.written() {
            println!("{kind}: {}", path.display());
        }
        println!("success: {}", report.is_success());
    }
    addon.on_destroy_effect_runtime(&mut runtime, state);

    Ok(())
}
