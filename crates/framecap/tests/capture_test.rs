//! Integration tests for the capture flow.
//!
//! A mock effect runtime drives the add-on over the host-memory device, so
//! every test runs without a GPU. Output files go to a per-test directory
//! under the system temp dir.

use std::path::{Path, PathBuf};

use exr::prelude::{read_all_flat_layers_from_file, FlatSamples};
use framecap::*;
use framecap_core::DeviceApi;
use framecap_render::DeviceCall;

struct MockRuntime {
    device: CpuDevice,
    key_down: bool,
    screenshot_size: (u32, u32),
    screenshot_available: bool,
    variables: Vec<(String, Option<ResourceView>)>,
    exe: PathBuf,
}

impl MockRuntime {
    fn new(device: CpuDevice, dir: &Path) -> Self {
        Self {
            device,
            key_down: false,
            screenshot_size: (4, 2),
            screenshot_available: true,
            variables: Vec::new(),
            exe: dir.join("game.exe"),
        }
    }

    /// Uploads `texels` as a texture and binds a view of it to `name`.
    fn bind(&mut self, name: &str, desc: ResourceDesc, texels: &[f32]) -> ResourceView {
        let resource = self
            .device
            .create_texture_with_data(&desc, bytemuck::cast_slice(texels));
        let view = self.device.create_view(resource);
        self.variables.push((name.to_owned(), Some(view)));
        view
    }

    fn unbind(&mut self, name: &str) {
        for (variable, view) in &mut self.variables {
            if variable == name {
                *view = None;
            }
        }
    }
}

impl EffectRuntime for MockRuntime {
    type Device = CpuDevice;

    fn device_mut(&mut self) -> &mut CpuDevice {
        &mut self.device
    }

    fn is_key_pressed(&self, key: u32) -> bool {
        self.key_down && key == TRIGGER_KEY
    }

    fn screenshot_size(&self) -> (u32, u32) {
        self.screenshot_size
    }

    fn capture_screenshot(&mut self, pixels: &mut [u8]) -> bool {
        if !self.screenshot_available {
            return false;
        }
        for (i, px) in pixels.chunks_exact_mut(4).enumerate() {
            px.copy_from_slice(&[(i * 10) as u8, 128, 255, 255]);
        }
        true
    }

    fn enumerate_texture_variables(&self, callback: &mut dyn FnMut(TextureVariable)) {
        for index in 0..self.variables.len() {
            callback(TextureVariable(index as u64));
        }
    }

    fn texture_variable_name(&self, variable: TextureVariable) -> Option<String> {
        self.variables
            .get(variable.0 as usize)
            .map(|(name, _)| name.clone())
    }

    fn texture_binding(&self, variable: TextureVariable) -> Option<ResourceView> {
        self.variables
            .get(variable.0 as usize)
            .and_then(|(_, view)| *view)
    }

    fn executable_path(&self) -> PathBuf {
        self.exe.clone()
    }
}

fn output_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("framecap_it_{test}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create output dir");
    dir
}

fn gpu_texture(width: u32, height: u32, format: Format) -> ResourceDesc {
    ResourceDesc::texture(
        width,
        height,
        format,
        MemoryHeap::GpuOnly,
        ResourceUsage::SHADER_RESOURCE | ResourceUsage::COPY_SOURCE,
    )
}

fn capture_settings(export_depth: bool, export_normal: bool) -> CaptureSettings {
    CaptureSettings {
        capture_enabled: true,
        export_depth,
        export_normal,
    }
}

fn frame_capture_addon(settings: CaptureSettings) -> Addon<MemoryConfigStore> {
    let mut addon = Addon::new(AddonProfile::FrameCapture, MemoryConfigStore::new());
    addon.on_init_device();
    addon.update_settings(settings).expect("memory store accepts writes");
    addon
}

/// Runs one frame with the trigger key held and returns the capture report.
fn capture_frame<S: ConfigStore>(
    addon: &mut Addon<S>,
    runtime: &mut MockRuntime,
    state: &mut RuntimeState,
) -> CaptureReport {
    runtime.key_down = true;
    addon.on_begin_effects(runtime, state);
    let report = addon.on_present(runtime, state).expect("trigger fired");
    runtime.key_down = false;
    report
}

fn read_channels(path: &Path) -> Vec<(String, FlatSamples)> {
    let image = read_all_flat_layers_from_file(path).expect("readable EXR");
    image.layer_data[0]
        .channel_data
        .list
        .iter()
        .map(|c| (c.name.to_string(), c.sample_data.clone()))
        .collect()
}

fn f32_channel(channels: &[(String, FlatSamples)], name: &str) -> Vec<f32> {
    match channels.iter().find(|(n, _)| n == name) {
        Some((_, FlatSamples::F32(samples))) => samples.clone(),
        other => panic!("channel {name}: unexpected {other:?}"),
    }
}

#[test]
fn test_unbound_export_is_skipped_and_screenshot_written() {
    let dir = output_dir("unbound");
    let mut addon = frame_capture_addon(capture_settings(true, false));
    let mut runtime = MockRuntime::new(CpuDevice::new(DeviceApi::D3D12), &dir);
    let mut state = addon.on_init_effect_runtime();

    let report = capture_frame(&mut addon, &mut runtime, &mut state);

    let screenshot = report.screenshot.as_ref().expect("screenshot written");
    assert!(screenshot.exists());
    assert!(screenshot
        .to_string_lossy()
        .ends_with(" BackBuffer.bmp"));
    let bitmap = image::open(screenshot).expect("readable bitmap").to_rgba8();
    assert_eq!(bitmap.dimensions(), (4, 2));
    assert_eq!(bitmap.get_pixel(1, 0).0, [10, 128, 255, 255]);

    assert_eq!(report.exports.len(), 1);
    assert!(matches!(
        &report.exports[0].outcome,
        ExportOutcome::Skipped(FrameCaptureError::BindingUnavailable(name))
            if name == "DepthToAddon_ExportTex"
    ));
    assert!(report.is_success());
    assert!(runtime.device.created_resources().is_empty());
    assert_eq!(addon.capture_state(), CaptureState::Idle);
}

#[test]
fn test_depth_export_writes_broadcast_exr() {
    let dir = output_dir("depth");
    let mut addon = frame_capture_addon(capture_settings(true, false));
    let mut runtime = MockRuntime::new(CpuDevice::new(DeviceApi::D3D12), &dir);
    let depth: Vec<f32> = (0..8u8).map(|i| f32::from(i) / 8.0).collect();
    runtime.bind("DepthToAddon_ExportTex", gpu_texture(4, 2, Format::R32Float), &depth);
    let mut state = addon.on_init_effect_runtime();

    let report = capture_frame(&mut addon, &mut runtime, &mut state);
    assert!(report.is_success());

    let written: Vec<_> = report.written().collect();
    assert_eq!(written.len(), 1);
    let (kind, path) = written[0];
    assert_eq!(kind, TextureKind::Depth);
    assert!(path.to_string_lossy().ends_with(" DepthBuffer.exr"));
    assert_eq!(path.parent(), Some(dir.as_path()));

    let channels = read_channels(path);
    let names: Vec<&str> = channels.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["B", "G", "R"]);
    for name in ["B", "G", "R"] {
        assert_eq!(f32_channel(&channels, name), depth);
    }

    // One staging buffer, released after the capture.
    assert_eq!(runtime.device.created_resources().len(), 1);
    assert_eq!(runtime.device.outstanding_maps(), 0);
    assert_eq!(
        runtime
            .device
            .calls()
            .iter()
            .filter(|c| matches!(c, DeviceCall::Destroy(_)))
            .count(),
        1
    );
}

#[test]
fn test_normal_export_maps_first_three_channels() {
    let dir = output_dir("normal");
    let mut addon = frame_capture_addon(capture_settings(false, true));
    let mut runtime = MockRuntime::new(CpuDevice::new(DeviceApi::Vulkan), &dir);
    let texels = [0.1f32, 0.2, 0.3, 0.9, -0.5, 0.25, 1.0, 0.0];
    runtime.bind(
        "DepthToAddon_ExportTex",
        gpu_texture(2, 1, Format::R32G32B32A32Float),
        &texels,
    );
    let mut state = addon.on_init_effect_runtime();

    let report = capture_frame(&mut addon, &mut runtime, &mut state);
    assert!(report.is_success());
    let (kind, path) = report.written().next().expect("normal map written");
    assert_eq!(kind, TextureKind::Normal);
    assert!(path.to_string_lossy().ends_with(" NormalMap.exr"));

    let channels = read_channels(path);
    assert_eq!(f32_channel(&channels, "B"), [0.1, -0.5]);
    assert_eq!(f32_channel(&channels, "G"), [0.2, 0.25]);
    assert_eq!(f32_channel(&channels, "R"), [0.3, 1.0]);
}

#[test]
fn test_mismatched_kind_fails_without_failing_other_exports() {
    let dir = output_dir("mismatch");
    let mut addon = frame_capture_addon(capture_settings(true, true));
    let mut runtime = MockRuntime::new(CpuDevice::new(DeviceApi::D3D12), &dir);
    runtime.bind(
        "DepthToAddon_ExportTex",
        gpu_texture(1, 1, Format::R32Float),
        &[0.75],
    );
    let mut state = addon.on_init_effect_runtime();

    let report = capture_frame(&mut addon, &mut runtime, &mut state);

    assert!(report.screenshot.is_ok());
    assert!(matches!(report.exports[0].outcome, ExportOutcome::Written(_)));
    assert!(matches!(
        report.exports[1].outcome,
        ExportOutcome::Failed(ExportError::Decode(_))
    ));
    assert!(!report.is_success());
    assert_eq!(runtime.device.outstanding_maps(), 0);
}

#[test]
fn test_texture_copy_path_when_buffer_copies_unsupported() {
    let dir = output_dir("texture_copy");
    let mut addon = frame_capture_addon(capture_settings(true, false));
    let device = CpuDevice::new(DeviceApi::D3D11)
        .without_buffer_copies()
        .with_texture_row_alignment(64);
    let mut runtime = MockRuntime::new(device, &dir);
    let depth = [0.5f32; 6];
    runtime.bind("DepthToAddon_ExportTex", gpu_texture(3, 2, Format::R32Typeless), &depth);
    let mut state = addon.on_init_effect_runtime();

    let report = capture_frame(&mut addon, &mut runtime, &mut state);
    assert!(report.is_success());

    let created = runtime.device.created_resources();
    assert_eq!(created.len(), 1);
    let extent = created[0].texture_extent().expect("texture staging resource");
    assert_eq!(extent.format, Format::R32Float);

    let (_, path) = report.written().next().expect("depth written");
    let channels = read_channels(path);
    assert!(f32_channel(&channels, "R").iter().all(|&v| v == 0.5));
}

#[test]
fn test_trigger_requires_key_and_enable_flag() {
    let dir = output_dir("gating");
    let mut addon = frame_capture_addon(CaptureSettings {
        capture_enabled: false,
        export_depth: true,
        export_normal: true,
    });
    let mut runtime = MockRuntime::new(CpuDevice::new(DeviceApi::D3D12), &dir);
    let mut state = addon.on_init_effect_runtime();

    runtime.key_down = true;
    addon.on_begin_effects(&mut runtime, &mut state);
    assert!(addon.on_present(&mut runtime, &state).is_none());

    addon
        .update_settings(capture_settings(true, true))
        .expect("memory store accepts writes");
    runtime.key_down = false;
    assert!(addon.on_present(&mut runtime, &state).is_none());

    runtime.key_down = true;
    assert!(addon.on_present(&mut runtime, &state).is_some());
    assert_eq!(std::fs::read_dir(&dir).map(Iterator::count).unwrap_or(0), 1);
}

#[test]
fn test_raw_depth_profile_writes_half_floats() {
    let dir = output_dir("raw");
    let mut addon = Addon::new(AddonProfile::RawDepthExport, MemoryConfigStore::new());
    addon.on_init_device();
    assert!(!addon.settings().capture_enabled);

    let mut runtime = MockRuntime::new(CpuDevice::new(DeviceApi::D3D12), &dir);
    runtime.bind(
        "DepthToAddonTex",
        gpu_texture(1, 1, Format::R32G32B32A32Float),
        &[0.25, 0.5, 0.75, 1.0],
    );
    let mut state = addon.on_init_effect_runtime();

    let report = capture_frame(&mut addon, &mut runtime, &mut state);
    assert!(report.is_success());
    let screenshot = report.screenshot.as_ref().expect("screenshot written");
    assert!(screenshot.to_string_lossy().contains("game.exe_"));

    let (kind, path) = report.written().next().expect("depth written");
    assert_eq!(kind, TextureKind::PackedDepth);
    let channels = read_channels(path);
    // The first packed channel lands in red.
    let expected = [("R", 0.25f32), ("G", 0.5), ("B", 0.75)];
    for (name, value) in expected {
        match channels.iter().find(|(n, _)| n == name) {
            Some((_, FlatSamples::F16(samples))) => assert_eq!(samples[0].to_f32(), value),
            other => panic!("channel {name}: unexpected {other:?}"),
        }
    }
}

#[test]
fn test_missing_screenshot_is_reported() {
    let dir = output_dir("no_screenshot");
    let mut addon = frame_capture_addon(capture_settings(false, false));
    let mut runtime = MockRuntime::new(CpuDevice::new(DeviceApi::D3D12), &dir);
    runtime.screenshot_available = false;
    let mut state = addon.on_init_effect_runtime();

    let report = capture_frame(&mut addon, &mut runtime, &mut state);
    assert!(matches!(
        report.screenshot,
        Err(CaptureError::ScreenshotUnavailable { width: 4, height: 2 })
    ));
    assert!(!report.is_success());
}

#[test]
fn test_binding_refresh_and_teardown() {
    let dir = output_dir("refresh");
    let addon = frame_capture_addon(capture_settings(true, true));
    let mut runtime = MockRuntime::new(CpuDevice::new(DeviceApi::D3D12), &dir);
    let view = runtime.bind(
        "DepthToAddon_ExportTex",
        gpu_texture(2, 2, Format::R32Float),
        &[0.0; 4],
    );
    let mut state = addon.on_init_effect_runtime();
    assert_eq!(state.lookup(), BindingLookup::Absent);

    addon.on_begin_effects(&mut runtime, &mut state);
    let bound = state.lookup().found().expect("binding resolved");
    assert_eq!(bound.view, view);
    assert_eq!(
        state.binding().summary().as_deref(),
        Some("DepthToAddon_ExportTex | 2x2 | R32_FLOAT")
    );

    runtime.unbind("DepthToAddon_ExportTex");
    addon.on_begin_effects(&mut runtime, &mut state);
    assert_eq!(state.lookup(), BindingLookup::Absent);

    runtime.variables[0].1 = Some(view);
    addon.on_begin_effects(&mut runtime, &mut state);
    addon.on_destroy_effect_runtime(&mut runtime, state);
    assert!(!runtime.device.is_view_alive(view));
}

#[test]
fn test_preview_entries() {
    let dir = output_dir("preview");
    let addon = frame_capture_addon(capture_settings(true, true));
    let mut runtime = MockRuntime::new(CpuDevice::new(DeviceApi::D3D12), &dir);
    runtime.bind(
        "DepthToAddon_DepthTex",
        gpu_texture(8, 4, Format::R32Float),
        &[0.0; 32],
    );
    runtime.variables.push(("DepthToAddon_NormalTex".to_owned(), None));

    let entries = addon.preview(&mut runtime);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "DepthTex | 8x4 | R32_FLOAT");
    assert!(entries[0].view.is_some());
    assert_eq!(entries[1].text, "NormalTex not found!");
    assert!(entries[1].view.is_none());
}

#[test]
fn test_settings_persist_through_json_store() {
    let dir = output_dir("settings");
    let path = dir.join("framecap.json");
    let settings = capture_settings(true, false);

    let mut addon = Addon::new(
        AddonProfile::FrameCapture,
        JsonConfigStore::open(&path).expect("open new store"),
    );
    addon.on_init_device();
    assert_eq!(*addon.settings(), CaptureSettings::default());
    addon.update_settings(settings).expect("settings saved");

    let mut reloaded = Addon::new(
        AddonProfile::FrameCapture,
        JsonConfigStore::open(&path).expect("reopen store"),
    );
    reloaded.on_init_device();
    assert_eq!(*reloaded.settings(), settings);
}
