//! The capture trigger and the work done for one capture.
//!
//! Captures run synchronously inside the present callback: the trigger is
//! checked, the screenshot and every enabled export are written, and the
//! state machine returns to [`CaptureState::Idle`] before the callback ends.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use framecap_core::{BindingLookup, CaptureSettings, FrameCaptureError};
use framecap_render::{export_texture, save_bitmap, screenshot_len, ExportError, TextureKind};

use crate::error::CaptureError;
use crate::host::EffectRuntime;
use crate::naming::CapturePrefix;
use crate::profile::{AddonProfile, ExportTarget, BACK_BUFFER_FILE};
use crate::runtime::RuntimeState;

/// Virtual key code that triggers a capture (F10).
pub const TRIGGER_KEY: u32 = 0x79;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing,
}

/// What happened to one export of a capture.
#[derive(Debug)]
pub enum ExportOutcome {
    /// The EXR file was written.
    Written(PathBuf),
    /// Nothing was bound to the export texture variable.
    Skipped(FrameCaptureError),
    /// Readback, decoding, or encoding failed.
    Failed(ExportError),
}

#[derive(Debug)]
pub struct ExportRecord {
    pub kind: TextureKind,
    pub outcome: ExportOutcome,
}

/// Result of one capture.
#[derive(Debug)]
pub struct CaptureReport {
    pub prefix: CapturePrefix,
    /// Path of the written screenshot.
    pub screenshot: Result<PathBuf, CaptureError>,
    pub exports: Vec<ExportRecord>,
}

impl CaptureReport {
    /// True if the screenshot was written and no export failed. Skipped
    /// exports do not count as failures.
    pub fn is_success(&self) -> bool {
        self.screenshot.is_ok()
            && !self
                .exports
                .iter()
                .any(|e| matches!(e.outcome, ExportOutcome::Failed(_)))
    }

    /// Paths of the EXR files written.
    pub fn written(&self) -> impl Iterator<Item = (TextureKind, &Path)> {
        self.exports.iter().filter_map(|e| match &e.outcome {
            ExportOutcome::Written(path) => Some((e.kind, path.as_path())),
            _ => None,
        })
    }
}

/// Trigger state machine.
#[derive(Debug, Default)]
pub struct CaptureTrigger {
    state: CaptureState,
}

impl CaptureTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Whether a capture starts this frame.
    pub fn is_triggered<R: EffectRuntime + ?Sized>(
        runtime: &R,
        settings: &CaptureSettings,
        profile: AddonProfile,
    ) -> bool {
        runtime.is_key_pressed(TRIGGER_KEY)
            && (settings.capture_enabled || !profile.requires_enable_flag())
    }

    /// Present-callback entry point. Runs a capture if the trigger fired.
    pub fn on_present<R: EffectRuntime + ?Sized>(
        &mut self,
        runtime: &mut R,
        state: &RuntimeState,
        settings: &CaptureSettings,
        profile: AddonProfile,
    ) -> Option<CaptureReport> {
        if !Self::is_triggered(&*runtime, settings, profile) {
            return None;
        }
        Some(self.capture_at(runtime, state, settings, profile, &Local::now()))
    }

    /// Runs one capture with `time` as its timestamp.
    pub fn capture_at<R: EffectRuntime + ?Sized>(
        &mut self,
        runtime: &mut R,
        state: &RuntimeState,
        settings: &CaptureSettings,
        profile: AddonProfile,
        time: &DateTime<Local>,
    ) -> CaptureReport {
        self.state = CaptureState::Capturing;
        log::debug!("Capture started ({})", profile.display_name());

        let prefix = CapturePrefix::new(&runtime.executable_path(), profile.separator(), time);
        let screenshot = write_screenshot(runtime, &prefix.file(BACK_BUFFER_FILE));
        if let Err(err) = &screenshot {
            log::error!("Failed to save screenshot: {err}");
        }

        let exports = profile
            .export_targets(settings)
            .into_iter()
            .map(|target| ExportRecord {
                kind: target.kind,
                outcome: run_export(runtime, state, &prefix, target, profile),
            })
            .collect();

        self.state = CaptureState::Idle;
        CaptureReport {
            prefix,
            screenshot,
            exports,
        }
    }
}

fn write_screenshot<R: EffectRuntime + ?Sized>(
    runtime: &mut R,
    path: &Path,
) -> Result<PathBuf, CaptureError> {
    let (width, height) = runtime.screenshot_size();
    let mut pixels = vec![0u8; screenshot_len(width, height)];
    if !runtime.capture_screenshot(&mut pixels) {
        return Err(CaptureError::ScreenshotUnavailable { width, height });
    }
    save_bitmap(path, &pixels, width, height)?;
    log::info!("Saved screenshot to {}", path.display());
    Ok(path.to_path_buf())
}

fn run_export<R: EffectRuntime + ?Sized>(
    runtime: &mut R,
    state: &RuntimeState,
    prefix: &CapturePrefix,
    target: ExportTarget,
    profile: AddonProfile,
) -> ExportOutcome {
    let texture = match state.lookup() {
        BindingLookup::Found(texture) => texture,
        BindingLookup::Absent => {
            let name = state.binding().name().to_owned();
            log::info!("'{name}' is not bound, skipping {} export", target.kind);
            return ExportOutcome::Skipped(FrameCaptureError::BindingUnavailable(name));
        }
    };

    let path = prefix.file(target.file_name);
    match export_texture(
        runtime.device_mut(),
        &texture,
        target.kind,
        &path,
        profile.precision(),
    ) {
        Ok(()) => ExportOutcome::Written(path),
        Err(err) => {
            log::error!("Failed to export {} texture: {err}", target.kind);
            ExportOutcome::Failed(err)
        }
    }
}
