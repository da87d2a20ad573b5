use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::Node;
use crate::utils::math::direction;

/// A picking ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaycastQuery {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Largest perpendicular distance at which a node still counts as hit.
    pub max_distance: f32,
}

impl RaycastQuery {
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction,
            max_distance,
        }
    }
}

/// Surface node picked by a ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRayHit {
    pub node: usize,
    /// Distance from the ray origin to the node.
    pub distance: f32,
    /// Perpendicular distance from the node to the ray.
    pub offset: f32,
}

pub struct Raycast;

impl Raycast {
    /// Nearest surface node lying in front of the ray origin and within
    /// `max_distance` of the ray. Ties keep the earlier surface node.
    pub fn closest_surface_node(query: &RaycastQuery, nodes: &[Node], surface: &[usize]) -> Option<NodeRayHit> {
        let dir = direction(query.direction)?;
        let mut best: Option<NodeRayHit> = None;

        for &index in surface {
            let Some(node) = nodes.get(index) else {
                continue;
            };
            let to_node = node.position - query.origin;
            let along = to_node.dot(dir);
            if along < 0.0 {
                continue;
            }
            let offset = (to_node - dir * along).length();
            if offset >= query.max_distance {
                continue;
            }

            let distance = to_node.length();
            if best.map_or(true, |hit| distance < hit.distance) {
                best = Some(NodeRayHit {
                    node: index,
                    distance,
                    offset,
                });
            }
        }

        best
    }
}
