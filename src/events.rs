use std::fmt;

#[derive(Debug, Clone)]
pub enum TourEvent {
    LoadRequested { zone: String, path: String },
    LoadReady { zone: String, nodes: usize, meshes: usize },
    LoadFailed { zone: String, message: String },
    StaleLoadDropped { zone: String, generation: u64 },
    SceneReleased { zone: String, meshes: usize, textures: usize },
    BoundaryTripped { context: String, message: String },
    ClipSelected { zone: String, index: usize, session: String },
    ClipClosed { zone: String },
}

impl fmt::Display for TourEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TourEvent::LoadRequested { zone, path } => {
                write!(f, "LoadRequested zone={zone} path={path}")
            }
            TourEvent::LoadReady { zone, nodes, meshes } => {
                write!(f, "LoadReady zone={zone} nodes={nodes} meshes={meshes}")
            }
            TourEvent::LoadFailed { zone, message } => {
                write!(f, "LoadFailed zone={zone} message={message}")
            }
            TourEvent::StaleLoadDropped { zone, generation } => {
                write!(f, "StaleLoadDropped zone={zone} generation={generation}")
            }
            TourEvent::SceneReleased { zone, meshes, textures } => {
                write!(f, "SceneReleased zone={zone} meshes={meshes} textures={textures}")
            }
            TourEvent::BoundaryTripped { context, message } => {
                write!(f, "BoundaryTripped context={context} message={message}")
            }
            TourEvent::ClipSelected { zone, index, session } => {
                write!(f, "ClipSelected zone={zone} index={index} session={session}")
            }
            TourEvent::ClipClosed { zone } => write!(f, "ClipClosed zone={zone}"),
        }
    }
}

/// Collects orchestration events for the current frame. The driver drains it
/// each tick; tests drain it to assert on what fired.
#[derive(Default)]
pub struct EventBus {
    events: Vec<TourEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: TourEvent) {
        log_event(&event);
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<TourEvent> {
        self.events.drain(..).collect()
    }
}

pub fn log_event(event: &TourEvent) {
    eprintln!("[tour] {event}");
}
