use glam::Vec3;
use log::debug;

use super::node::Node;
use crate::error::{Result, SimulationError};

/// Contiguous node arena plus the frozen neighbour topology.
///
/// Nodes reference each other only by index, so the cyclic adjacency never
/// owns anything and the whole graph can be reset or serialized trivially.
#[derive(Debug, Clone, Default)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    rest_positions: Vec<Vec3>,
    surface: Vec<usize>,
    origin: Vec3,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a `dim`×`dim`×`dim` lattice centred on `origin`.
    ///
    /// Nodes are indexed `x + dim * (y + dim * z)`; neighbours and surface
    /// nodes are recorded in x-major, then y, then z order.
    pub fn cuboid(dim: usize, dist_between: f32, mass: f32, origin: Vec3) -> Result<Self> {
        if dim == 0 {
            return Err(SimulationError::EmptyLattice);
        }

        let index_of = |x: usize, y: usize, z: usize| x + dim * (y + dim * z);
        let offset = Vec3::splat(dist_between * (dim - 1) as f32) * 0.5;

        let mut graph = Self {
            nodes: Vec::with_capacity(dim * dim * dim),
            rest_positions: Vec::with_capacity(dim * dim * dim),
            surface: Vec::new(),
            origin,
        };

        for z in 0..dim {
            for y in 0..dim {
                for x in 0..dim {
                    let local = Vec3::new(x as f32, y as f32, z as f32) * dist_between;
                    graph.add_node(local - offset + origin, mass)?;
                }
            }
        }

        let dim_i = dim as isize;
        for x in 0..dim {
            for y in 0..dim {
                for z in 0..dim {
                    let index = index_of(x, y, z);
                    for i in -1isize..=1 {
                        let nx = x as isize + i;
                        if nx < 0 || nx >= dim_i {
                            continue;
                        }
                        for j in -1isize..=1 {
                            let ny = y as isize + j;
                            if ny < 0 || ny >= dim_i {
                                continue;
                            }
                            for k in -1isize..=1 {
                                let nz = z as isize + k;
                                if nz < 0 || nz >= dim_i || (i == 0 && j == 0 && k == 0) {
                                    continue;
                                }
                                let near = index_of(nx as usize, ny as usize, nz as usize);
                                let face_adjacent = (i != 0) as u8 + (j != 0) as u8 + (k != 0) as u8 == 1;
                                graph.link(index, near, face_adjacent);
                            }
                        }
                    }
                    if graph.nodes[index].is_surface() {
                        graph.nodes[index].surface_index = Some(graph.surface.len());
                        graph.surface.push(index);
                    }
                }
            }
        }

        debug!(
            "spawned {dim}^3 lattice: {} nodes, {} on the surface",
            graph.nodes.len(),
            graph.surface.len()
        );
        Ok(graph)
    }

    /// Appends an unconnected node and returns its index.
    pub fn add_node(&mut self, position: Vec3, mass: f32) -> Result<usize> {
        let index = self.nodes.len();
        self.nodes.push(Node::new(index, position, mass)?);
        self.rest_positions.push(position);
        Ok(index)
    }

    /// Connects two nodes symmetrically.
    ///
    /// Call [`NodeGraph::rebuild_surface`] once the topology is complete.
    pub fn connect(&mut self, a: usize, b: usize, face_adjacent: bool) -> Result<()> {
        let count = self.nodes.len();
        for index in [a, b] {
            if index >= count {
                return Err(SimulationError::NodeOutOfBounds { index, count });
            }
        }
        if a == b || self.nodes[a].nearby.contains(&b) {
            return Ok(());
        }
        self.link(a, b, face_adjacent);
        self.link(b, a, face_adjacent);
        Ok(())
    }

    fn link(&mut self, from: usize, to: usize, face_adjacent: bool) {
        let offset = self.nodes[to].position - self.nodes[from].position;
        let node = &mut self.nodes[from];
        node.nearby.push(to);
        node.rest_offsets.push(offset);
        if face_adjacent {
            node.nearby_for_mesh.push(to);
        }
    }

    /// Recomputes the surface list in node-index order.
    pub fn rebuild_surface(&mut self) {
        self.surface.clear();
        for node in &mut self.nodes {
            node.surface_index = None;
            if node.is_surface() {
                node.surface_index = Some(self.surface.len());
                self.surface.push(node.index);
            }
        }
    }

    /// Reference point that mesh vertices are expressed relative to.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index)
    }

    /// Node indices of the boundary, in surface-index order.
    pub fn surface_nodes(&self) -> &[usize] {
        &self.surface
    }

    pub fn rest_position(&self, index: usize) -> Option<Vec3> {
        self.rest_positions.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Puts every node back on its rest position with no dynamic state.
    pub fn reset_to_rest(&mut self) {
        for (node, rest) in self.nodes.iter_mut().zip(self.rest_positions.iter()) {
            node.reset_to(*rest);
        }
    }
}
