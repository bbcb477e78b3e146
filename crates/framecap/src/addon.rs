//! Add-on lifecycle: the handlers a host registers for its events.
//!
//! The host calls these in frame order. [`Addon::on_begin_effects`] must run
//! before [`Addon::on_present`] in every frame so the capture reads the
//! binding of the current frame.

use framecap_core::{CaptureSettings, ConfigStore, Result};

use crate::capture::{CaptureReport, CaptureState, CaptureTrigger};
use crate::host::EffectRuntime;
use crate::overlay::{preview_entries, PreviewEntry};
use crate::profile::AddonProfile;
use crate::runtime::RuntimeState;

/// A loaded add-on instance.
#[derive(Debug)]
pub struct Addon<S: ConfigStore> {
    profile: AddonProfile,
    store: S,
    settings: CaptureSettings,
    trigger: CaptureTrigger,
}

impl<S: ConfigStore> Addon<S> {
    /// Creates the add-on. Settings stay at their defaults until
    /// [`Addon::on_init_device`] loads them.
    pub fn new(profile: AddonProfile, store: S) -> Self {
        log::info!("{} loaded", profile.display_name());
        Self {
            profile,
            store,
            settings: CaptureSettings::default(),
            trigger: CaptureTrigger::new(),
        }
    }

    pub fn profile(&self) -> AddonProfile {
        self.profile
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn capture_state(&self) -> CaptureState {
        self.trigger.state()
    }

    /// Device creation: loads the settings from the store.
    pub fn on_init_device(&mut self) {
        self.settings = CaptureSettings::load(&self.store);
        log::debug!("Loaded settings {:?}", self.settings);
    }

    /// Runtime creation: returns the state the host keeps for the runtime.
    pub fn on_init_effect_runtime(&self) -> RuntimeState {
        RuntimeState::new(self.profile.binding_name())
    }

    /// Runtime destruction: releases the view held by `state`.
    pub fn on_destroy_effect_runtime<R: EffectRuntime + ?Sized>(
        &self,
        runtime: &mut R,
        state: RuntimeState,
    ) {
        state.release(runtime.device_mut());
    }

    /// Effects are about to render: refreshes the tracked binding.
    pub fn on_begin_effects<R: EffectRuntime + ?Sized>(
        &self,
        runtime: &mut R,
        state: &mut RuntimeState,
    ) {
        state.refresh(runtime);
    }

    /// Frame presented: captures if the trigger key was pressed.
    pub fn on_present<R: EffectRuntime + ?Sized>(
        &mut self,
        runtime: &mut R,
        state: &RuntimeState,
    ) -> Option<CaptureReport> {
        self.trigger
            .on_present(runtime, state, &self.settings, self.profile)
    }

    /// Replaces the settings and writes them to the store if they changed.
    pub fn update_settings(&mut self, settings: CaptureSettings) -> Result<()> {
        if settings == self.settings {
            return Ok(());
        }
        self.settings = settings;
        self.settings.save(&mut self.store)
    }

    /// Entries for the settings overlay preview.
    pub fn preview<R: EffectRuntime + ?Sized>(&self, runtime: &mut R) -> Vec<PreviewEntry> {
        preview_entries(runtime, self.profile)
    }
}
