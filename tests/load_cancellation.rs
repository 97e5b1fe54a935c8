use anyhow::{anyhow, Result};
use glam::{Mat4, Vec2, Vec3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tour_engine::events::{EventBus, TourEvent};
use tour_engine::loader::{LoadState, SceneLoader, SceneSource};
use tour_engine::scene::{Geometry, Material, MeshNode, MeshVertex, SceneGraph, SceneNode};

/// Asset source whose loads block until the test releases them, so the test
/// controls which request resolves first.
struct GatedSource {
    gates: Mutex<HashMap<PathBuf, Receiver<Result<SceneGraph, String>>>>,
}

impl GatedSource {
    fn new() -> (Self, GateControl) {
        (Self { gates: Mutex::new(HashMap::new()) }, GateControl::default())
    }
}

#[derive(Default)]
struct GateControl {
    senders: HashMap<PathBuf, Sender<Result<SceneGraph, String>>>,
}

impl GateControl {
    fn resolve(&self, path: &str, outcome: Result<SceneGraph, String>) {
        self.senders[Path::new(path)].send(outcome).expect("gate still open");
    }
}

fn gate(source: &GatedSource, control: &mut GateControl, path: &str) {
    let (tx, rx) = channel();
    source.gates.lock().unwrap().insert(PathBuf::from(path), rx);
    control.senders.insert(PathBuf::from(path), tx);
}

impl SceneSource for GatedSource {
    fn load(&self, path: &Path) -> Result<SceneGraph> {
        let rx = self
            .gates
            .lock()
            .unwrap()
            .remove(path)
            .ok_or_else(|| anyhow!("no gate registered for {}", path.display()))?;
        rx.recv().map_err(|_| anyhow!("gate dropped"))?.map_err(|message| anyhow!(message))
    }
}

fn tiny_graph() -> SceneGraph {
    let vertices = vec![
        MeshVertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO),
        MeshVertex::new(Vec3::X, Vec3::Z, Vec2::X),
        MeshVertex::new(Vec3::Y, Vec3::Z, Vec2::Y),
    ];
    let mesh = MeshNode {
        name: None,
        geometry: Geometry::new(vertices, vec![0, 1, 2]),
        material: Material::untextured("default"),
    };
    let root =
        SceneNode { name: None, transform: Mat4::IDENTITY, mesh: Some(mesh), children: Vec::new() };
    SceneGraph { source: "gated".to_string(), roots: vec![root], bounds: Default::default() }
}

fn poll_until<F>(loader: &mut SceneLoader, events: &mut EventBus, mut done: F) -> Vec<TourEvent>
where
    F: FnMut(&mut SceneLoader, &mut EventBus, &mut Vec<TourEvent>) -> bool,
{
    let mut seen = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if done(loader, events, &mut seen) {
            return seen;
        }
        assert!(Instant::now() < deadline, "loader did not settle in time");
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn superseded_load_resolution_is_dropped() {
    let (source, mut control) = GatedSource::new();
    gate(&source, &mut control, "a.glb");
    gate(&source, &mut control, "b.glb");

    let mut events = EventBus::default();
    let mut loader = SceneLoader::new("zone1", Arc::new(source));
    let first = loader.request("a.glb", &mut events);
    let second = loader.request("b.glb", &mut events);
    assert_ne!(first, second);

    // The superseded request resolves first; it must not set Ready state or
    // hand back a handle.
    control.resolve("a.glb", Ok(tiny_graph()));
    poll_until(&mut loader, &mut events, |loader, events, seen| {
        assert!(loader.poll(events).is_none(), "stale resolution must not yield a handle");
        seen.extend(events.drain());
        seen.iter()
            .any(|e| matches!(e, TourEvent::StaleLoadDropped { generation, .. } if *generation == first))
    });
    assert_eq!(loader.state(), Some(&LoadState::Pending), "current request is still in flight");

    // The live request resolves afterwards and becomes the one Ready scene.
    control.resolve("b.glb", Ok(tiny_graph()));
    let mut handle = None;
    poll_until(&mut loader, &mut events, |loader, events, seen| {
        if let Some(h) = loader.poll(events) {
            handle = Some(h);
        }
        seen.extend(events.drain());
        handle.is_some()
    });
    let handle = handle.expect("live request produced the handle");
    assert_eq!(handle.generation(), second);
    assert_eq!(loader.state(), Some(&LoadState::Ready));
}

#[test]
fn stale_failure_does_not_touch_current_state() {
    let (source, mut control) = GatedSource::new();
    gate(&source, &mut control, "a.glb");
    gate(&source, &mut control, "b.glb");

    let mut events = EventBus::default();
    let mut loader = SceneLoader::new("zone1", Arc::new(source));
    let first = loader.request("a.glb", &mut events);
    loader.request("b.glb", &mut events);

    control.resolve("a.glb", Err("late network error".to_string()));
    poll_until(&mut loader, &mut events, |loader, events, seen| {
        loader.poll(events);
        seen.extend(events.drain());
        seen.iter()
            .any(|e| matches!(e, TourEvent::StaleLoadDropped { generation, .. } if *generation == first))
    });
    assert_eq!(
        loader.state(),
        Some(&LoadState::Pending),
        "a superseded failure must not mark the live request failed"
    );

    control.resolve("b.glb", Ok(tiny_graph()));
    poll_until(&mut loader, &mut events, |loader, events, seen| {
        loader.poll(events).is_some() || {
            seen.extend(events.drain());
            loader.state() == Some(&LoadState::Ready)
        }
    });
    assert_eq!(loader.state(), Some(&LoadState::Ready));
}
