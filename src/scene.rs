use anyhow::{anyhow, bail, Context, Result};
use glam::{Mat4, Vec2, Vec3};
use gltf::mesh::Mode;
use std::collections::HashMap;
use std::path::Path;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position: position.to_array(), normal: normal.to_array(), uv: uv.to_array() }
    }
}

/// Index/vertex data for one renderable mesh. The host uploads it; the
/// lifecycle visitor frees it on teardown.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    disposed: bool,
}

impl Geometry {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices, disposed: false }
    }

    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.vertices = Vec::new();
        self.indices = Vec::new();
        self.disposed = true;
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[derive(Clone, Debug)]
pub struct TextureMap {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    disposed: bool,
}

impl TextureMap {
    pub fn new(label: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { label: label.into(), width, height, pixels, disposed: false }
    }

    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.pixels = Vec::new();
        self.disposed = true;
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Material with the seven independently-optional texture slots the release
/// visitor walks. glTF never fills the light map; it exists for scenes baked
/// by other pipelines.
#[derive(Clone, Debug)]
pub struct Material {
    pub label: String,
    pub base_color_factor: [f32; 4],
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub emissive_factor: [f32; 3],
    pub color_map: Option<TextureMap>,
    pub light_map: Option<TextureMap>,
    pub ambient_occlusion_map: Option<TextureMap>,
    pub emissive_map: Option<TextureMap>,
    pub normal_map: Option<TextureMap>,
    pub roughness_map: Option<TextureMap>,
    pub metalness_map: Option<TextureMap>,
    disposed: bool,
}

impl Material {
    pub fn untextured(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            metallic_factor: 0.0,
            roughness_factor: 1.0,
            emissive_factor: [0.0, 0.0, 0.0],
            color_map: None,
            light_map: None,
            ambient_occlusion_map: None,
            emissive_map: None,
            normal_map: None,
            roughness_map: None,
            metalness_map: None,
            disposed: false,
        }
    }

    pub fn map_slots_mut(&mut self) -> [&mut Option<TextureMap>; 7] {
        [
            &mut self.color_map,
            &mut self.light_map,
            &mut self.ambient_occlusion_map,
            &mut self.emissive_map,
            &mut self.normal_map,
            &mut self.roughness_map,
            &mut self.metalness_map,
        ]
    }

    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        true
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[derive(Clone, Debug)]
pub struct MeshNode {
    pub name: Option<String>,
    pub geometry: Geometry,
    pub material: Material,
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: Option<String>,
    pub transform: Mat4,
    pub mesh: Option<MeshNode>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn group(name: Option<String>, transform: Mat4) -> Self {
        Self { name, transform, mesh: None, children: Vec::new() }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GraphBounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
    pub radius: f32,
}

/// Owned node/mesh/material hierarchy for one loaded zone model. Ownership
/// flows strictly from the graph down to its nodes; no back-references.
#[derive(Clone, Debug)]
pub struct SceneGraph {
    pub source: String,
    pub roots: Vec<SceneNode>,
    pub bounds: GraphBounds,
}

impl SceneGraph {
    pub fn node_count(&self) -> usize {
        fn count(node: &SceneNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }

    pub fn mesh_count(&self) -> usize {
        fn count(node: &SceneNode) -> usize {
            usize::from(node.mesh.is_some()) + node.children.iter().map(count).sum::<usize>()
        }
        self.roots.iter().map(count).sum()
    }
}

pub fn load_gltf(path: impl AsRef<Path>) -> Result<SceneGraph> {
    let path_ref = path.as_ref();
    let (document, buffers, images) = gltf::import(path_ref)
        .with_context(|| format!("Failed to import glTF from {}", path_ref.display()))?;

    let mut texture_pixels: HashMap<usize, (u32, u32, Vec<u8>)> = HashMap::new();
    for texture in document.textures() {
        let source = texture.source();
        let image_data = images
            .get(source.index())
            .ok_or_else(|| anyhow!("Image index {} missing in {}", source.index(), path_ref.display()))?;
        let pixels = convert_image_to_rgba(image_data)?;
        texture_pixels.insert(texture.index(), (image_data.width, image_data.height, pixels));
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| anyhow!("No scenes found in {}", path_ref.display()))?;

    let mut roots = Vec::new();
    for node in scene.nodes() {
        roots.push(build_node(&node, &buffers, &texture_pixels, path_ref)?);
    }
    if roots.is_empty() {
        bail!("Scene in {} has no nodes", path_ref.display());
    }

    let mut bounds = BoundsAccumulator::default();
    for root in &roots {
        bounds.visit(root, Mat4::IDENTITY);
    }

    Ok(SceneGraph { source: path_ref.display().to_string(), roots, bounds: bounds.finish() })
}

fn build_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    texture_pixels: &HashMap<usize, (u32, u32, Vec<u8>)>,
    path: &Path,
) -> Result<SceneNode> {
    let transform = Mat4::from_cols_array_2d(&node.transform().matrix());
    let name = node.name().map(|s| s.to_string());

    let mesh = match node.mesh() {
        Some(mesh) => build_mesh(&mesh, buffers, texture_pixels, path)?,
        None => None,
    };

    let mut children = Vec::new();
    for child in node.children() {
        children.push(build_node(&child, buffers, texture_pixels, path)?);
    }

    Ok(SceneNode { name, transform, mesh, children })
}

fn build_mesh(
    mesh: &gltf::Mesh,
    buffers: &[gltf::buffer::Data],
    texture_pixels: &HashMap<usize, (u32, u32, Vec<u8>)>,
    path: &Path,
) -> Result<Option<MeshNode>> {
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut material = None;

    for primitive in mesh.primitives() {
        if primitive.mode() != Mode::Triangles {
            continue;
        }
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let positions: Vec<Vec3> = reader
            .read_positions()
            .ok_or_else(|| anyhow!("POSITION attribute missing in {}", path.display()))?
            .map(Vec3::from_array)
            .collect();
        if positions.is_empty() {
            continue;
        }

        let mut normals: Vec<Vec3> = reader
            .read_normals()
            .map(|it| it.map(Vec3::from_array).collect())
            .unwrap_or_else(|| vec![Vec3::ZERO; positions.len()]);

        let mut tex_coords: Vec<Vec2> = reader
            .read_tex_coords(0)
            .map(|coords| coords.into_f32().map(Vec2::from_array).collect())
            .unwrap_or_else(|| vec![Vec2::ZERO; positions.len()]);

        let local_indices: Vec<u32> = reader
            .read_indices()
            .map(|read| read.into_u32().collect())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        if normals.len() != positions.len() || normals.iter().all(|n| n.length_squared() == 0.0) {
            normals = compute_normals(&positions, &local_indices);
        }
        if tex_coords.len() != positions.len() {
            tex_coords.resize(positions.len(), Vec2::ZERO);
        }

        let base_vertex = vertices.len() as u32;
        vertices.extend(positions.iter().enumerate().map(|(i, pos)| {
            let norm = normals.get(i).copied().unwrap_or(Vec3::Y).normalize_or_zero();
            let uv = tex_coords.get(i).copied().unwrap_or(Vec2::ZERO);
            MeshVertex::new(*pos, norm, uv)
        }));
        indices.extend(local_indices.iter().map(|idx| idx + base_vertex));

        if material.is_none() {
            material = Some(build_material(&primitive.material(), texture_pixels));
        }
    }

    if vertices.is_empty() {
        return Ok(None);
    }

    let material = material.unwrap_or_else(|| Material::untextured("default"));
    Ok(Some(MeshNode {
        name: mesh.name().map(|s| s.to_string()),
        geometry: Geometry::new(vertices, indices),
        material,
    }))
}

fn build_material(
    material: &gltf::Material,
    texture_pixels: &HashMap<usize, (u32, u32, Vec<u8>)>,
) -> Material {
    let label = material.name().unwrap_or("default").to_string();
    let pbr = material.pbr_metallic_roughness();
    let mut out = Material::untextured(label.clone());
    out.base_color_factor = pbr.base_color_factor();
    out.metallic_factor = pbr.metallic_factor();
    out.roughness_factor = pbr.roughness_factor();
    out.emissive_factor = material.emissive_factor();

    let fetch = |index: usize, slot: &str| -> Option<TextureMap> {
        texture_pixels
            .get(&index)
            .map(|(w, h, pixels)| TextureMap::new(format!("{label}::{slot}"), *w, *h, pixels.clone()))
    };

    if let Some(info) = pbr.base_color_texture() {
        out.color_map = fetch(info.texture().index(), "color");
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        // One combined source texture backs both slots; each slot owns its
        // copy so disposal stays per-slot.
        out.roughness_map = fetch(info.texture().index(), "roughness");
        out.metalness_map = fetch(info.texture().index(), "metalness");
    }
    if let Some(info) = material.normal_texture() {
        out.normal_map = fetch(info.texture().index(), "normal");
    }
    if let Some(info) = material.occlusion_texture() {
        out.ambient_occlusion_map = fetch(info.texture().index(), "ao");
    }
    if let Some(info) = material.emissive_texture() {
        out.emissive_map = fetch(info.texture().index(), "emissive");
    }
    out
}

fn convert_image_to_rgba(image: &gltf::image::Data) -> Result<Vec<u8>> {
    match image.format {
        gltf::image::Format::R8 => {
            let mut out = Vec::with_capacity(image.pixels.len() * 4);
            for &value in &image.pixels {
                out.extend_from_slice(&[value, value, value, 255]);
            }
            Ok(out)
        }
        gltf::image::Format::R8G8 => {
            let mut out = Vec::with_capacity(image.pixels.len() / 2 * 4);
            for chunk in image.pixels.chunks_exact(2) {
                out.extend_from_slice(&[chunk[0], chunk[1], 0, 255]);
            }
            Ok(out)
        }
        gltf::image::Format::R8G8B8 => {
            let mut out = Vec::with_capacity(image.pixels.len() / 3 * 4);
            for chunk in image.pixels.chunks_exact(3) {
                out.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
            }
            Ok(out)
        }
        gltf::image::Format::R8G8B8A8 => Ok(image.pixels.clone()),
        other => bail!("Unsupported image format {:?}", other),
    }
}

fn compute_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks(3) {
        if tri.len() < 3 {
            continue;
        }
        let i0 = tri[0] as usize;
        let i1 = tri[1] as usize;
        let i2 = tri[2] as usize;
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        if normal.length_squared() > 0.0 {
            normals[i0] += normal;
            normals[i1] += normal;
            normals[i2] += normal;
        }
    }
    for normal in &mut normals {
        *normal = if normal.length_squared() > 0.0 { normal.normalize() } else { Vec3::Y };
    }
    normals
}

#[derive(Default)]
struct BoundsAccumulator {
    min: Option<Vec3>,
    max: Option<Vec3>,
}

impl BoundsAccumulator {
    fn visit(&mut self, node: &SceneNode, parent: Mat4) {
        let world = parent * node.transform;
        if let Some(mesh) = &node.mesh {
            for vertex in &mesh.geometry.vertices {
                let pos = world.transform_point3(Vec3::from_array(vertex.position));
                self.min = Some(self.min.map_or(pos, |m| m.min(pos)));
                self.max = Some(self.max.map_or(pos, |m| m.max(pos)));
            }
        }
        for child in &node.children {
            self.visit(child, world);
        }
    }

    fn finish(self) -> GraphBounds {
        match (self.min, self.max) {
            (Some(min), Some(max)) => {
                let center = (min + max) * 0.5;
                GraphBounds { min, max, center, radius: (max - center).length() }
            }
            _ => GraphBounds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_fixture_scene_graph() {
        let graph = load_gltf("fixtures/models/demo_room.gltf").expect("fixture gltf should load");
        assert_eq!(graph.mesh_count(), 1);
        assert!(graph.node_count() >= 1);
        let mesh = graph.roots[0].mesh.as_ref().expect("root carries the mesh");
        assert_eq!(mesh.geometry.vertices.len(), 3);
        assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
        assert!(!mesh.geometry.is_disposed());
        assert!(graph.bounds.radius > 0.0);
    }

    #[test]
    fn texture_map_dispose_is_single_shot() {
        let mut map = TextureMap::new("m::color", 2, 2, vec![0; 16]);
        assert!(map.dispose());
        assert!(map.pixels.is_empty());
        assert!(!map.dispose());
    }
}
