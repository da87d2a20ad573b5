use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Neighbour count of an interior node in the 3×3×3 lattice neighbourhood.
pub const FULL_NEIGHBORHOOD: usize = 26;

/// A point mass of the soft body lattice.
///
/// Adjacency is stored as indices into the owning [`NodeGraph`](super::NodeGraph).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable identity and position in the node array.
    pub index: usize,
    /// Position in the surface node list, when this is a boundary node.
    pub surface_index: Option<usize>,
    mass: f32,
    inverse_mass: f32,

    pub position: Vec3,
    pub velocity: Vec3,
    pub external_forces: Vec3,

    // Working state of the current tick.
    pub predicted_position: Vec3,
    pub prev_predicted: Vec3,
    pub corrected_displacement: Vec3,

    /// Accumulated local orientation.
    pub rotation: Quat,
    /// Rotation gathered during the current commit.
    pub corrected_rotation: Quat,

    // Force propagation accumulator.
    pub normal: Vec3,
    pub normal_count: u32,

    /// 26-neighbourhood in the generating lattice.
    pub nearby: Vec<usize>,
    /// Face-adjacent subset of `nearby`.
    pub nearby_for_mesh: Vec<usize>,
    /// Rest offsets `neighbour - self`, parallel to `nearby`.
    pub rest_offsets: Vec<Vec3>,
}

impl Node {
    /// Creates a node at rest. Fails when `mass` is not positive and finite.
    pub fn new(index: usize, position: Vec3, mass: f32) -> Result<Self> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimulationError::InvalidMass(mass));
        }

        Ok(Self {
            index,
            surface_index: None,
            mass,
            inverse_mass: 1.0 / mass,
            position,
            velocity: Vec3::ZERO,
            external_forces: Vec3::ZERO,
            predicted_position: position,
            prev_predicted: position,
            corrected_displacement: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            corrected_rotation: Quat::IDENTITY,
            normal: Vec3::ZERO,
            normal_count: 0,
            nearby: Vec::new(),
            nearby_for_mesh: Vec::new(),
            rest_offsets: Vec::new(),
        })
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Boundary nodes have fewer than the full 26 lattice neighbours.
    pub fn is_surface(&self) -> bool {
        self.nearby.len() < FULL_NEIGHBORHOOD
    }

    /// Neighbour count used to normalise per-pair corrections.
    pub fn neighbor_weight(&self) -> f32 {
        self.nearby.len().max(1) as f32
    }

    /// Clears the per-tick accumulators.
    pub fn begin_tick(&mut self) {
        self.external_forces = Vec3::ZERO;
        self.corrected_displacement = Vec3::ZERO;
        self.corrected_rotation = Quat::IDENTITY;
    }

    /// Accumulated propagation normal averaged over its contributors.
    pub fn averaged_normal(&self) -> Vec3 {
        if self.normal_count == 0 {
            self.normal
        } else {
            self.normal / self.normal_count as f32
        }
    }

    /// Restores the rest pose and drops every piece of dynamic state.
    pub fn reset_to(&mut self, rest_position: Vec3) {
        self.position = rest_position;
        self.velocity = Vec3::ZERO;
        self.external_forces = Vec3::ZERO;
        self.predicted_position = rest_position;
        self.prev_predicted = rest_position;
        self.corrected_displacement = Vec3::ZERO;
        self.rotation = Quat::IDENTITY;
        self.corrected_rotation = Quat::IDENTITY;
        self.normal = Vec3::ZERO;
        self.normal_count = 0;
    }
}
