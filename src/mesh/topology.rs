//! Surface triangulation grown edge by edge over the boundary nodes.
//!
//! Works purely on surface indices and adjacency lists, so the output depends
//! only on the order of the surface list and each node's neighbour lists.
//! Every triangle has exactly one lattice diagonal; its two ends must share a
//! fourth boundary node so that the triangle is half of a boundary square.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::NodeGraph;
use crate::error::{Result, SimulationError};
use crate::utils::math::signed_triangle_volume;

/// Triangle over surface indices, in winding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub i1: usize,
    pub i2: usize,
    pub i3: usize,
}

impl Triangle {
    pub fn new(i1: usize, i2: usize, i3: usize) -> Self {
        Self { i1, i2, i3 }
    }

    pub fn indices(&self) -> [usize; 3] {
        [self.i1, self.i2, self.i3]
    }

    fn key(&self) -> [usize; 3] {
        let mut key = self.indices();
        key.sort_unstable();
        key
    }

    pub fn flipped(&self) -> Self {
        Self::new(self.i1, self.i3, self.i2)
    }
}

/// Undirected edge with the number of triangles using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub i1: usize,
    pub i2: usize,
    pub amount: u32,
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Boundary-restricted adjacency, in surface indices.
struct SurfaceAdjacency {
    near: Vec<Vec<usize>>,
    near_for_mesh: Vec<Vec<usize>>,
}

impl SurfaceAdjacency {
    fn new(graph: &NodeGraph) -> Self {
        let nodes = graph.nodes();
        let to_surface = |list: &[usize]| -> Vec<usize> {
            list.iter().filter_map(|&i| nodes[i].surface_index).collect()
        };
        let near = graph
            .surface_nodes()
            .iter()
            .map(|&i| to_surface(&nodes[i].nearby))
            .collect();
        let near_for_mesh = graph
            .surface_nodes()
            .iter()
            .map(|&i| to_surface(&nodes[i].nearby_for_mesh))
            .collect();
        Self { near, near_for_mesh }
    }

    fn face_adjacent(&self, a: usize, b: usize) -> bool {
        self.near_for_mesh[a].contains(&b)
    }

    /// Third nodes for edge `(a, b)`: face neighbours of `b` that `a` also sees.
    fn candidates(&self, a: usize, b: usize) -> impl Iterator<Item = usize> + '_ {
        self.near_for_mesh[b]
            .iter()
            .copied()
            .filter(move |&c| c != a && self.near[a].contains(&c))
    }
}

/// Frozen triangle and edge lists of a surface.
#[derive(Debug, Clone, Default)]
pub struct MeshTopology {
    triangles: Vec<Triangle>,
    edges: Vec<Edge>,
    edge_lookup: HashMap<(usize, usize), usize>,
    triangle_keys: HashSet<[usize; 3]>,
}

impl MeshTopology {
    /// Grows the topology over the graph's surface nodes.
    ///
    /// Fails when no seed triangle exists, e.g. for a lattice too small to
    /// have a boundary square.
    pub fn grow(graph: &NodeGraph) -> Result<Self> {
        let surface_count = graph.surface_nodes().len();
        if surface_count < 3 {
            return Err(SimulationError::mesh_seed(format!(
                "need at least 3 surface nodes, found {surface_count}"
            )));
        }

        let adjacency = SurfaceAdjacency::new(graph);
        let mut topology = Self::default();

        let Some((a, b, c)) = topology.find_seed(&adjacency) else {
            warn!("no seed triangle among {surface_count} surface nodes");
            return Err(SimulationError::mesh_seed(format!(
                "no valid seed triangle among {surface_count} surface nodes"
            )));
        };

        topology.register(a, b, c);
        let mut pending = vec![(a, c), (c, b), (b, a)];

        while let Some((a, b)) = pending.pop() {
            if topology.edge_amount(a, b) >= 2 {
                continue;
            }
            let next = adjacency.candidates(a, b).find(|&c| {
                topology.edge_amount(b, c) < 2
                    && topology.edge_amount(c, a) < 2
                    && topology.is_valid(&adjacency, a, b, c)
            });
            if let Some(c) = next {
                topology.register(a, b, c);
                pending.push((a, c));
                pending.push((c, b));
            }
        }

        let positions: Vec<Vec3> = graph
            .surface_nodes()
            .iter()
            .map(|&i| graph.nodes()[i].position)
            .collect();
        if topology.signed_volume(&positions) < 0.0 {
            topology.flip_winding();
        }

        let open_edges = topology.edges.iter().filter(|e| e.amount != 2).count();
        if open_edges > 0 {
            warn!("surface mesh has {open_edges} edges not shared by two triangles");
        }
        debug!(
            "grew surface mesh: {} triangles, {} edges over {surface_count} surface nodes",
            topology.triangles.len(),
            topology.edges.len()
        );
        Ok(topology)
    }

    fn find_seed(&self, adjacency: &SurfaceAdjacency) -> Option<(usize, usize, usize)> {
        for a in 0..adjacency.near.len() {
            for &b in &adjacency.near[a] {
                if let Some(c) = adjacency
                    .candidates(a, b)
                    .find(|&c| self.is_valid(adjacency, a, b, c))
                {
                    return Some((a, b, c));
                }
            }
        }
        None
    }

    /// A trio forms half of a boundary square: one diagonal pair, a shared
    /// fourth node, and neither the same triangle nor the square's other
    /// split already recorded.
    fn is_valid(&self, adjacency: &SurfaceAdjacency, a: usize, b: usize, c: usize) -> bool {
        if a == b || b == c || c == a {
            return false;
        }
        let pairs = [(a, b, c), (b, c, a), (c, a, b)];
        let mut diagonal = None;
        for (x, y, apex) in pairs {
            if !adjacency.face_adjacent(x, y) {
                if diagonal.is_some() {
                    return false;
                }
                diagonal = Some((x, y, apex));
            }
        }
        let Some((x, y, apex)) = diagonal else {
            return false;
        };

        let Some(other) = adjacency.near_for_mesh[x]
            .iter()
            .copied()
            .find(|&n| n != apex && adjacency.near_for_mesh[y].contains(&n))
        else {
            return false;
        };

        let exists = |p: usize, q: usize, r: usize| self.triangle_keys.contains(&Triangle::new(p, q, r).key());
        if exists(x, apex, other) || exists(y, apex, other) {
            return false;
        }
        !exists(a, b, c)
    }

    fn register(&mut self, a: usize, b: usize, c: usize) {
        let triangle = Triangle::new(a, b, c);
        self.triangle_keys.insert(triangle.key());
        self.triangles.push(triangle);
        for (p, q) in [(a, b), (b, c), (c, a)] {
            match self.edge_lookup.get(&edge_key(p, q)) {
                Some(&slot) => self.edges[slot].amount += 1,
                None => {
                    self.edge_lookup.insert(edge_key(p, q), self.edges.len());
                    self.edges.push(Edge {
                        i1: p,
                        i2: q,
                        amount: 1,
                    });
                }
            }
        }
    }

    /// Number of triangles using the edge, in either direction.
    pub fn edge_amount(&self, a: usize, b: usize) -> u32 {
        self.edge_lookup
            .get(&edge_key(a, b))
            .map_or(0, |&slot| self.edges[slot].amount)
    }

    fn flip_winding(&mut self) {
        for triangle in &mut self.triangles {
            *triangle = triangle.flipped();
        }
    }

    /// Signed enclosed volume for vertex positions indexed by surface index.
    pub fn signed_volume(&self, vertices: &[Vec3]) -> f32 {
        self.triangles
            .iter()
            .map(|t| signed_triangle_volume(vertices[t.i1], vertices[t.i2], vertices[t.i3]))
            .sum()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains_triangle(&self, a: usize, b: usize, c: usize) -> bool {
        self.triangle_keys.contains(&Triangle::new(a, b, c).key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice(dim: usize) -> NodeGraph {
        NodeGraph::cuboid(dim, 0.1, 1.0, Vec3::ZERO).unwrap()
    }

    #[test]
    fn five_cube_surface_is_closed() {
        let topology = MeshTopology::grow(&lattice(5)).unwrap();
        assert_eq!(topology.triangles().len(), 192);
        assert_eq!(topology.edges().len(), 288);
        assert!(topology.edges().iter().all(|e| e.amount == 2));
    }

    #[test]
    fn two_cube_has_two_triangles_per_face() {
        let topology = MeshTopology::grow(&lattice(2)).unwrap();
        assert_eq!(topology.triangles().len(), 12);
        assert_eq!(topology.edges().len(), 18);
    }

    #[test]
    fn winding_encloses_positive_volume() {
        let graph = lattice(3);
        let topology = MeshTopology::grow(&graph).unwrap();
        let vertices: Vec<Vec3> = graph
            .surface_nodes()
            .iter()
            .map(|&i| graph.nodes()[i].position)
            .collect();
        let volume = topology.signed_volume(&vertices);
        assert!((volume - 0.008).abs() < 1e-5);
    }

    #[test]
    fn single_node_cannot_seed() {
        assert!(matches!(
            MeshTopology::grow(&lattice(1)),
            Err(SimulationError::MeshSeed(_))
        ));
    }

    #[test]
    fn no_triangle_spans_a_crease() {
        let graph = lattice(4);
        let topology = MeshTopology::grow(&graph).unwrap();
        let nodes = graph.nodes();
        let surface = graph.surface_nodes();
        for t in topology.triangles() {
            let p = t.indices().map(|i| nodes[surface[i]].position);
            let normal = (p[1] - p[0]).cross(p[2] - p[0]);
            let axis_aligned = normal.abs().cmpgt(Vec3::splat(1e-6)).bitmask().count_ones() == 1;
            assert!(axis_aligned, "triangle {t:?} is not on a cube face");
        }
    }
}
