use glam::Vec3;

use super::topology::{Edge, MeshTopology, Triangle};
use crate::core::{Aabb, Node, NodeGraph};
use crate::error::Result;

/// Renderable boundary of a soft body.
///
/// Topology is grown once; `update` only rewrites vertex positions, which
/// are kept relative to the body origin and ordered by surface index.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    topology: MeshTopology,
    surface: Vec<usize>,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn generate(graph: &NodeGraph) -> Result<Self> {
        let topology = MeshTopology::grow(graph)?;
        let indices = topology
            .triangles()
            .iter()
            .flat_map(|t| t.indices())
            .map(|i| i as u32)
            .collect();

        let mut mesh = Self {
            topology,
            surface: graph.surface_nodes().to_vec(),
            vertices: vec![Vec3::ZERO; graph.surface_nodes().len()],
            indices,
        };
        mesh.update(graph.nodes(), graph.origin());
        Ok(mesh)
    }

    /// Copies committed boundary positions into the vertex buffer.
    pub fn update(&mut self, nodes: &[Node], origin: Vec3) {
        for (vertex, &index) in self.vertices.iter_mut().zip(&self.surface) {
            *vertex = nodes[index].position - origin;
        }
    }

    /// Enclosed volume of the current vertex positions.
    pub fn volume(&self) -> f32 {
        self.topology.signed_volume(&self.vertices).abs()
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Index buffer, three entries per triangle.
    pub fn flat_indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangles(&self) -> &[Triangle] {
        self.topology.triangles()
    }

    pub fn edges(&self) -> &[Edge] {
        self.topology.edges()
    }

    pub fn topology(&self) -> &MeshTopology {
        &self.topology
    }

    /// Node index behind each vertex.
    pub fn surface_nodes(&self) -> &[usize] {
        &self.surface
    }
}
