use crate::config::EntryPanConfig;
use glam::Vec3;

/// Overview fly-in: camera x sweeps across the facility while aiming at a
/// fixed target, then snaps once to the terminal framing.
#[derive(Debug, Clone, Copy)]
pub struct EstablishingPan {
    pub start_x: f32,
    pub end_x: f32,
    pub window: f32,
    pub look_at: Vec3,
    pub terminal_position: Vec3,
}

impl Default for EstablishingPan {
    fn default() -> Self {
        Self {
            start_x: 600.0,
            end_x: -300.0,
            window: 5.0,
            look_at: Vec3::new(0.0, 20.0, 0.0),
            terminal_position: Vec3::new(-400.0, 180.0, 400.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraSample {
    Panning { x: f32, look_at: Vec3 },
    Terminal { position: Vec3, look_at: Vec3 },
}

/// Group offset for the entry pan: exact lerp on `[0, duration)`, the end
/// offset (zero) from `duration` onward.
pub fn entry_pan_offset(profile: &EntryPanConfig, elapsed: f32) -> Vec3 {
    let t = if profile.duration > 0.0 { (elapsed.max(0.0) / profile.duration).min(1.0) } else { 1.0 };
    let x = profile.start_x + (0.0 - profile.start_x) * t;
    Vec3::new(x, 0.0, 0.0)
}

/// Pure pose for the establishing pan. Strict less-than governs the panning
/// branch: at exactly `window` the terminal pose wins.
pub fn establishing_pose(profile: &EstablishingPan, elapsed: f32) -> CameraSample {
    if elapsed < profile.window {
        let t = (elapsed.max(0.0) / profile.window).min(1.0);
        let x = profile.start_x + (profile.end_x - profile.start_x) * t;
        CameraSample::Panning { x, look_at: profile.look_at }
    } else {
        CameraSample::Terminal { position: profile.terminal_position, look_at: profile.look_at }
    }
}

/// Per-handle animation record. The zero-time reference is captured on the
/// first sample after the handle appears and never reset while it lives; the
/// terminal pose is applied exactly once.
#[derive(Debug, Clone, Default)]
pub struct PanState {
    start_ref: Option<f32>,
    terminal_applied: bool,
    pub apply_count: u32,
}

impl PanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time relative to the lazily captured start reference.
    pub fn local_elapsed(&mut self, clock_elapsed: f32) -> f32 {
        let start = *self.start_ref.get_or_insert(clock_elapsed);
        (clock_elapsed - start).max(0.0)
    }

    pub fn sample_entry(&mut self, profile: &EntryPanConfig, clock_elapsed: f32) -> Vec3 {
        let elapsed = self.local_elapsed(clock_elapsed);
        entry_pan_offset(profile, elapsed)
    }

    pub fn sample_establishing(&mut self, profile: &EstablishingPan, clock_elapsed: f32) -> CameraSample {
        let elapsed = self.local_elapsed(clock_elapsed);
        let sample = establishing_pose(profile, elapsed);
        if matches!(sample, CameraSample::Terminal { .. }) && !self.terminal_applied {
            self.terminal_applied = true;
            self.apply_count += 1;
        }
        sample
    }

    pub fn terminal_applied(&self) -> bool {
        self.terminal_applied
    }
}
