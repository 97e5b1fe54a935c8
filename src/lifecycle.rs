use crate::animation::PanState;
use crate::events::{log_event, EventBus, TourEvent};
use crate::scene::{SceneGraph, SceneNode};

/// What one release pass actually freed. A second pass over the same graph
/// reports zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseStats {
    pub geometries: usize,
    pub textures: usize,
    pub materials: usize,
}

impl ReleaseStats {
    pub fn is_empty(&self) -> bool {
        self.geometries == 0 && self.textures == 0 && self.materials == 0
    }
}

/// Walks every node reachable from the roots and disposes geometry, each
/// populated texture slot, then the material, for every renderable mesh.
/// Idempotent: already-disposed resources are skipped.
pub fn release(graph: &mut SceneGraph) -> ReleaseStats {
    let mut stats = ReleaseStats::default();
    for root in &mut graph.roots {
        release_node(root, &mut stats);
    }
    stats
}

fn release_node(node: &mut SceneNode, stats: &mut ReleaseStats) {
    if let Some(mesh) = node.mesh.as_mut() {
        if mesh.geometry.dispose() {
            stats.geometries += 1;
        }
        for slot in mesh.material.map_slots_mut() {
            if let Some(map) = slot.as_mut() {
                if map.dispose() {
                    stats.textures += 1;
                }
            }
        }
        if mesh.material.dispose() {
            stats.materials += 1;
        }
    }
    for child in &mut node.children {
        release_node(child, stats);
    }
}

/// Exclusive ownership of one loaded zone scene. At most one live handle per
/// zone screen; per-handle animation state lives here so it is discarded with
/// the handle. Release fires exactly once on every exit path: explicitly via
/// `release_into`, or on drop for early navigation away.
pub struct SceneHandle {
    zone: String,
    generation: u64,
    graph: SceneGraph,
    pub pan: PanState,
    released: bool,
}

impl SceneHandle {
    pub fn new(zone: impl Into<String>, generation: u64, graph: SceneGraph) -> Self {
        Self { zone: zone.into(), generation, graph, pan: PanState::new(), released: false }
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Tears the scene down and reports to the event bus. Safe to call more
    /// than once; later calls do nothing.
    pub fn release_into(&mut self, events: &mut EventBus) -> ReleaseStats {
        if self.released {
            return ReleaseStats::default();
        }
        let stats = release(&mut self.graph);
        self.released = true;
        events.push(TourEvent::SceneReleased {
            zone: self.zone.clone(),
            meshes: stats.geometries,
            textures: stats.textures,
        });
        stats
    }
}

impl Drop for SceneHandle {
    fn drop(&mut self) {
        if !self.released {
            let stats = release(&mut self.graph);
            self.released = true;
            log_event(&TourEvent::SceneReleased {
                zone: self.zone.clone(),
                meshes: stats.geometries,
                textures: stats.textures,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Geometry, Material, MeshNode, MeshVertex, SceneGraph, TextureMap};
    use glam::{Mat4, Vec2, Vec3};

    fn test_graph() -> SceneGraph {
        let vertices = vec![
            MeshVertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO),
            MeshVertex::new(Vec3::X, Vec3::Z, Vec2::X),
            MeshVertex::new(Vec3::Y, Vec3::Z, Vec2::Y),
        ];
        let mut material = Material::untextured("walls");
        material.color_map = Some(TextureMap::new("walls::color", 2, 2, vec![0; 16]));
        material.normal_map = Some(TextureMap::new("walls::normal", 2, 2, vec![0; 16]));
        let mesh = MeshNode {
            name: Some("walls".to_string()),
            geometry: Geometry::new(vertices, vec![0, 1, 2]),
            material,
        };
        let child = SceneNode {
            name: Some("walls".to_string()),
            transform: Mat4::IDENTITY,
            mesh: Some(mesh),
            children: Vec::new(),
        };
        let root = SceneNode {
            name: Some("root".to_string()),
            transform: Mat4::IDENTITY,
            mesh: None,
            children: vec![child],
        };
        SceneGraph { source: "test".to_string(), roots: vec![root], bounds: Default::default() }
    }

    #[test]
    fn release_disposes_every_populated_slot() {
        let mut graph = test_graph();
        let stats = release(&mut graph);
        assert_eq!(stats, ReleaseStats { geometries: 1, textures: 2, materials: 1 });
    }

    #[test]
    fn second_release_is_a_no_op() {
        let mut graph = test_graph();
        let first = release(&mut graph);
        assert!(!first.is_empty());
        let second = release(&mut graph);
        assert!(second.is_empty());
    }

    #[test]
    fn handle_releases_once_across_explicit_and_drop_paths() {
        let mut events = EventBus::default();
        let mut handle = SceneHandle::new("zone1", 1, test_graph());
        let stats = handle.release_into(&mut events);
        assert_eq!(stats.geometries, 1);
        assert!(handle.is_released());
        assert!(handle.release_into(&mut events).is_empty());
        drop(handle); // must not fire a second release
        let released: Vec<_> = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e, TourEvent::SceneReleased { .. }))
            .collect();
        assert_eq!(released.len(), 1);
    }
}
