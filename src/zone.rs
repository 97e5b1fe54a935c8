use crate::animation::{entry_pan_offset, establishing_pose, CameraSample, EstablishingPan};
use crate::boundary::ErrorBoundary;
use crate::carousel::ClipCarousel;
use crate::config::ZoneConfig;
use crate::events::EventBus;
use crate::lifecycle::SceneHandle;
use crate::loader::{LoadState, SceneLoader, SceneSource};
use anyhow::Result;
use glam::Vec3;
use std::sync::Arc;

/// Everything the presentation layer needs to draw one frame of a zone.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    pub load_state: Option<LoadState>,
    pub group_offset: Vec3,
    pub viewer_visible: bool,
    pub fallback: Option<String>,
}

/// Per-zone orchestration: one loader, one boundary, one carousel, at most
/// one live scene handle. The host render loop calls `on_frame` once per
/// tick and applies whatever poses/state come back.
pub struct ZoneScreen {
    config: ZoneConfig,
    loader: SceneLoader,
    boundary: ErrorBoundary,
    carousel: ClipCarousel,
    handle: Option<SceneHandle>,
}

impl ZoneScreen {
    pub fn new(config: ZoneConfig) -> Self {
        let loader = SceneLoader::gltf(config.name.clone());
        Self::assemble(config, loader)
    }

    /// Same wiring with an injected asset source (tests gate resolution).
    pub fn with_source(config: ZoneConfig, source: Arc<dyn SceneSource>) -> Self {
        let loader = SceneLoader::new(config.name.clone(), source);
        Self::assemble(config, loader)
    }

    fn assemble(config: ZoneConfig, loader: SceneLoader) -> Self {
        let boundary = ErrorBoundary::new(format!("{} model", config.name));
        let carousel = ClipCarousel::new(config.name.clone(), config.clips.clone());
        Self { config, loader, boundary, carousel, handle: None }
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    pub fn handle(&self) -> Option<&SceneHandle> {
        self.handle.as_ref()
    }

    pub fn load_state(&self) -> Option<&LoadState> {
        self.loader.state()
    }

    pub fn carousel(&self) -> &ClipCarousel {
        &self.carousel
    }

    pub fn boundary(&self) -> &ErrorBoundary {
        &self.boundary
    }

    /// Entering the zone: fresh boundary identity, any previous scene is
    /// torn down, and the zone model starts loading.
    pub fn enter(&mut self, events: &mut EventBus) {
        self.boundary.remount();
        if let Some(handle) = self.handle.as_mut() {
            handle.release_into(events);
        }
        self.handle = None;
        self.loader.request(self.config.model_path.clone(), events);
    }

    /// Navigating away: in-flight loads go stale and the scene is released.
    pub fn leave(&mut self, events: &mut EventBus) {
        self.loader.cancel();
        if let Some(handle) = self.handle.as_mut() {
            handle.release_into(events);
        }
        self.handle = None;
        self.carousel.close(events);
    }

    /// One orchestration tick. Never blocks: the load resolves through the
    /// loader's channel while the pan keeps animating off the clock sample.
    pub fn on_frame(&mut self, clock_elapsed: f32, events: &mut EventBus) -> FrameOutput {
        if let Some(new_handle) = self.loader.poll(events) {
            // Old scene goes before the new one is adopted, never interleaved.
            if let Some(old) = self.handle.as_mut() {
                old.release_into(events);
            }
            self.handle = Some(new_handle);
        }

        if let Some(LoadState::Failed(message)) = self.loader.state() {
            let message = message.clone();
            self.boundary.trip(message, events);
        }

        let group_offset = match self.handle.as_mut() {
            Some(handle) => handle.pan.sample_entry(&self.config.entry_pan, clock_elapsed),
            // Still loading: the group sits at the pan's start offset.
            None => entry_pan_offset(&self.config.entry_pan, 0.0),
        };

        let viewer_visible =
            self.carousel.selection().is_none() || self.config.viewer_visible_during_playback;

        FrameOutput {
            load_state: self.loader.state().cloned(),
            group_offset,
            viewer_visible,
            fallback: self.boundary.fallback_message().map(str::to_string),
        }
    }

    pub fn select_clip(&mut self, index: usize, events: &mut EventBus) -> Result<()> {
        self.carousel.select(index, events)?;
        Ok(())
    }

    pub fn close_clip(&mut self, events: &mut EventBus) {
        self.carousel.close(events);
    }

    /// Host notification that the playing clip ran to its end unattended.
    pub fn clip_finished(&mut self, events: &mut EventBus) {
        self.carousel.advance_on_end(events);
    }

    pub fn alternatives(&self) -> smallvec::SmallVec<[usize; crate::carousel::ALTERNATE_SLOTS]> {
        self.carousel.alternatives()
    }
}

/// Zone-selection overview: loads the facility master model and drives the
/// establishing camera pan across it. No carousel here; the zones own those.
pub struct OverviewScreen {
    model_path: String,
    profile: EstablishingPan,
    loader: SceneLoader,
    boundary: ErrorBoundary,
    handle: Option<SceneHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverviewFrame {
    pub load_state: Option<LoadState>,
    pub camera: CameraSample,
    pub fallback: Option<String>,
}

impl OverviewScreen {
    pub fn new(model_path: impl Into<String>) -> Self {
        let model_path = model_path.into();
        Self {
            loader: SceneLoader::gltf("overview"),
            boundary: ErrorBoundary::new("overview model"),
            profile: EstablishingPan::default(),
            handle: None,
            model_path,
        }
    }

    pub fn with_source(model_path: impl Into<String>, source: Arc<dyn SceneSource>) -> Self {
        let mut screen = Self::new(model_path);
        screen.loader = SceneLoader::new("overview", source);
        screen
    }

    pub fn handle(&self) -> Option<&SceneHandle> {
        self.handle.as_ref()
    }

    pub fn boundary(&self) -> &ErrorBoundary {
        &self.boundary
    }

    pub fn enter(&mut self, events: &mut EventBus) {
        self.boundary.remount();
        if let Some(handle) = self.handle.as_mut() {
            handle.release_into(events);
        }
        self.handle = None;
        self.loader.request(self.model_path.clone(), events);
    }

    pub fn leave(&mut self, events: &mut EventBus) {
        self.loader.cancel();
        if let Some(handle) = self.handle.as_mut() {
            handle.release_into(events);
        }
        self.handle = None;
    }

    pub fn on_frame(&mut self, clock_elapsed: f32, events: &mut EventBus) -> OverviewFrame {
        if let Some(new_handle) = self.loader.poll(events) {
            if let Some(old) = self.handle.as_mut() {
                old.release_into(events);
            }
            self.handle = Some(new_handle);
        }

        if let Some(LoadState::Failed(message)) = self.loader.state() {
            let message = message.clone();
            self.boundary.trip(message, events);
        }

        let camera = match self.handle.as_mut() {
            Some(handle) => handle.pan.sample_establishing(&self.profile, clock_elapsed),
            None => establishing_pose(&self.profile, 0.0),
        };

        OverviewFrame {
            load_state: self.loader.state().cloned(),
            camera,
            fallback: self.boundary.fallback_message().map(str::to_string),
        }
    }
}
