use crate::events::{EventBus, TourEvent};
use crate::lifecycle::SceneHandle;
use crate::scene::{self, SceneGraph};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// Shown when a load fails without any usable diagnostic text.
pub const GENERIC_LOAD_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed(String),
}

/// The 3D-asset loader capability the core consumes. Production uses the
/// glTF importer; tests inject gated sources to control resolution order.
pub trait SceneSource: Send + Sync + 'static {
    fn load(&self, path: &Path) -> Result<SceneGraph>;
}

pub struct GltfSource;

impl SceneSource for GltfSource {
    fn load(&self, path: &Path) -> Result<SceneGraph> {
        scene::load_gltf(path)
    }
}

struct LoadResult {
    generation: u64,
    outcome: Result<SceneGraph, String>,
}

/// Tracks one zone's scene load. Each `request` starts a fresh generation;
/// the worker reports through a channel the frame loop drains, so the render
/// tick never blocks on the fetch. Results from superseded generations are
/// dropped without touching state.
pub struct SceneLoader {
    zone: String,
    source: Arc<dyn SceneSource>,
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
    generation: u64,
    state: Option<LoadState>,
    ready_fired: bool,
}

impl SceneLoader {
    pub fn new(zone: impl Into<String>, source: Arc<dyn SceneSource>) -> Self {
        let (tx, rx) = channel();
        Self { zone: zone.into(), source, tx, rx, generation: 0, state: None, ready_fired: false }
    }

    pub fn gltf(zone: impl Into<String>) -> Self {
        Self::new(zone, Arc::new(GltfSource))
    }

    pub fn state(&self) -> Option<&LoadState> {
        self.state.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Kicks off a background load and marks the previous generation stale.
    pub fn request(&mut self, path: impl Into<PathBuf>, events: &mut EventBus) -> u64 {
        let path: PathBuf = path.into();
        self.generation += 1;
        self.state = Some(LoadState::Pending);
        self.ready_fired = false;
        events.push(TourEvent::LoadRequested {
            zone: self.zone.clone(),
            path: path.display().to_string(),
        });
        let tx = self.tx.clone();
        let source = Arc::clone(&self.source);
        let generation = self.generation;
        thread::spawn(move || {
            let outcome = source.load(&path).map_err(|err| format!("{err:#}"));
            // The receiver may be gone if the screen was torn down.
            let _ = tx.send(LoadResult { generation, outcome });
        });
        self.generation
    }

    /// Invalidates any in-flight load without starting a new one (navigation
    /// away). Late resolutions become stale and are discarded on poll.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.state = None;
        self.ready_fired = false;
    }

    /// Drains completed loads; called once per frame. Returns the new handle
    /// exactly once, when the current generation resolves successfully.
    pub fn poll(&mut self, events: &mut EventBus) -> Option<SceneHandle> {
        let mut ready = None;
        while let Ok(result) = self.rx.try_recv() {
            if result.generation != self.generation {
                events.push(TourEvent::StaleLoadDropped {
                    zone: self.zone.clone(),
                    generation: result.generation,
                });
                continue;
            }
            match result.outcome {
                Ok(graph) => {
                    if self.ready_fired {
                        continue;
                    }
                    self.state = Some(LoadState::Ready);
                    self.ready_fired = true;
                    events.push(TourEvent::LoadReady {
                        zone: self.zone.clone(),
                        nodes: graph.node_count(),
                        meshes: graph.mesh_count(),
                    });
                    ready = Some(SceneHandle::new(self.zone.clone(), result.generation, graph));
                }
                Err(message) => {
                    let message = if message.trim().is_empty() {
                        GENERIC_LOAD_ERROR.to_string()
                    } else {
                        message
                    };
                    self.state = Some(LoadState::Failed(message.clone()));
                    events.push(TourEvent::LoadFailed { zone: self.zone.clone(), message });
                }
            }
        }
        ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::time::{Duration, Instant};

    struct FailingSource {
        message: &'static str,
    }

    impl SceneSource for FailingSource {
        fn load(&self, _path: &Path) -> Result<SceneGraph> {
            Err(anyhow!("{}", self.message))
        }
    }

    fn poll_until<F: FnMut(&mut SceneLoader, &mut EventBus) -> bool>(
        loader: &mut SceneLoader,
        events: &mut EventBus,
        mut done: F,
    ) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(loader, events) {
            assert!(Instant::now() < deadline, "loader did not settle in time");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn blank_failure_message_falls_back_to_generic_diagnostic() {
        let mut events = EventBus::default();
        let mut loader = SceneLoader::new("zone1", Arc::new(FailingSource { message: "  " }));
        loader.request("missing.glb", &mut events);
        poll_until(&mut loader, &mut events, |loader, events| {
            loader.poll(events);
            matches!(loader.state(), Some(LoadState::Failed(_)))
        });
        match loader.state() {
            Some(LoadState::Failed(message)) => assert_eq!(message, GENERIC_LOAD_ERROR),
            other => panic!("expected failure, got {other:?}"),
        }
        let failures = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, TourEvent::LoadFailed { .. }))
            .count();
        assert_eq!(failures, 1, "failure must be logged exactly once");
    }

    #[test]
    fn failure_keeps_original_message_when_present() {
        let mut events = EventBus::default();
        let mut loader = SceneLoader::new("zone1", Arc::new(FailingSource { message: "corrupt chunk" }));
        loader.request("bad.glb", &mut events);
        poll_until(&mut loader, &mut events, |loader, events| {
            loader.poll(events);
            loader.state().is_some_and(|s| matches!(s, LoadState::Failed(_)))
        });
        match loader.state() {
            Some(LoadState::Failed(message)) => assert_eq!(message, "corrupt chunk"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn cancel_clears_state_and_marks_generation_stale() {
        let mut events = EventBus::default();
        let mut loader = SceneLoader::new("zone1", Arc::new(FailingSource { message: "x" }));
        let requested = loader.request("a.glb", &mut events);
        loader.cancel();
        assert!(loader.state().is_none());
        assert!(loader.generation() > requested);
        poll_until(&mut loader, &mut events, |loader, events| {
            loader.poll(events);
            events
                .drain()
                .into_iter()
                .any(|e| matches!(e, TourEvent::StaleLoadDropped { generation, .. } if generation == requested))
        });
        assert!(loader.state().is_none(), "stale failure must not set state");
    }
}
