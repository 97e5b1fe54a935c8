use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ClipEntry {
    pub title: String,
    pub url: String,
}

impl ClipEntry {
    pub fn new(title: &str, url: &str) -> Self {
        Self { title: title.to_string(), url: url.to_string() }
    }
}

/// Entry pan: one axis slides from `start_x` to 0 while the scene loads.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EntryPanConfig {
    #[serde(default = "EntryPanConfig::default_start_x")]
    pub start_x: f32,
    #[serde(default = "EntryPanConfig::default_duration")]
    pub duration: f32,
}

impl EntryPanConfig {
    const fn default_start_x() -> f32 {
        -20.0
    }

    const fn default_duration() -> f32 {
        3.0
    }
}

impl Default for EntryPanConfig {
    fn default() -> Self {
        Self { start_x: Self::default_start_x(), duration: Self::default_duration() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    pub model_path: String,
    #[serde(default = "ZoneConfig::default_scale")]
    pub scale: f32,
    /// Zone 2 keeps the 3D viewer on screen while a clip plays; the other
    /// zones swap the viewer out for the video modal.
    #[serde(default)]
    pub viewer_visible_during_playback: bool,
    #[serde(default)]
    pub entry_pan: EntryPanConfig,
    #[serde(default)]
    pub clips: Vec<ClipEntry>,
}

impl ZoneConfig {
    const fn default_scale() -> f32 {
        4.0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TourConfig {
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
}

impl TourConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read tour manifest {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse tour manifest {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("[tour] manifest load error: {err:?}. Falling back to built-in zones.");
                Self::default()
            }
        }
    }

    pub fn zone(&self, name: &str) -> Option<&ZoneConfig> {
        self.zones.iter().find(|zone| zone.name == name)
    }
}

impl Default for TourConfig {
    fn default() -> Self {
        let zone1 = ZoneConfig {
            name: "zone1".to_string(),
            model_path: "assets/models/Zone01.glb".to_string(),
            scale: 4.0,
            viewer_visible_during_playback: false,
            entry_pan: EntryPanConfig { start_x: -20.0, duration: 3.0 },
            clips: vec![
                ClipEntry::new("Reception & Lobby", "Zone-01/Zone01-Reception & Lobby.webm"),
                ClipEntry::new("Digital Twin Lab 1", "Zone-01/Zone01-Digital Twin Lab.webm"),
                ClipEntry::new("Waiting Area", "Zone-01/Zone01-WaitingArea.webm"),
                ClipEntry::new("Conference Hall", "Zone-01/Zone01-Conference Hall.webm"),
                ClipEntry::new("Display Area", "Zone-01/Zone01- Display Area.webm"),
                ClipEntry::new("Digital Twin Lab 2", "Zone-01/Zone01- Lab02.webm"),
                ClipEntry::new("Lounge", "Zone-01/Zone01- Lounge.webm"),
                ClipEntry::new("Cafétéria", "Zone-01/Zone01-Cafeteria.webm"),
            ],
        };
        let zone2 = ZoneConfig {
            name: "zone2".to_string(),
            model_path: "assets/models/Zone02.glb".to_string(),
            scale: 5.0,
            viewer_visible_during_playback: true,
            entry_pan: EntryPanConfig { start_x: -20.0, duration: 2.0 },
            clips: vec![
                ClipEntry::new("Machine Workshop", "Zone-02/Zone02- Machine workshop lab.webm"),
                ClipEntry::new("Fab Lab", "Zone-02/Zone02- Fabline+WetLab.webm"),
                ClipEntry::new("Pilot Area", "Zone-02/Zone02- Startup Pilot Demostration Area.webm"),
                ClipEntry::new("Vehicle Test Rig", "Zone-02/Zone02- Vehicle test Rig.webm"),
                ClipEntry::new("Characterization Lab", "Zone-02/Zone02- Charaterisation Lab.webm"),
                ClipEntry::new("Control Room", "Zone-02/Zone02- Control room.webm"),
            ],
        };
        let zone3 = ZoneConfig {
            name: "zone3".to_string(),
            model_path: "assets/models/Zone03.glb".to_string(),
            scale: 4.0,
            viewer_visible_during_playback: false,
            entry_pan: EntryPanConfig { start_x: -20.0, duration: 3.0 },
            clips: vec![
                ClipEntry::new("Hydrogen Storage Yard", "Zone-03/Zone03- Storage Yard.webm"),
                ClipEntry::new("Electrolyser Bay", "Zone-03/Zone03- Electrolyser Bay.webm"),
                ClipEntry::new("Fuel Cell Test Bench", "Zone-03/Zone03- Fuel Cell Test Bench.webm"),
                ClipEntry::new("Refuelling Station", "Zone-03/Zone03- Refuelling Station.webm"),
                ClipEntry::new("Safety & Training Room", "Zone-03/Zone03- Safety Room.webm"),
                ClipEntry::new("Outdoor Demo Track", "Zone-03/Zone03- Demo Track.webm"),
            ],
        };
        Self { zones: vec![zone1, zone2, zone3] }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TourConfigOverrides {
    pub zone: Option<String>,
    pub max_frames: Option<u32>,
}

impl TourConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.zone.is_none() && self.max_frames.is_none()
    }
}
