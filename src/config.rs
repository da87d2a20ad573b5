//! Global configuration for soft lattice bodies.
//!
//! Every tunable the simulation reads lives in [`SimulationConfig`]. The
//! constants below are the defaults it starts from.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Default gravity vector (Y-up, deliberately gentle).
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, -1.0, 0.0];

/// Default fixed tick length (in seconds).
pub const DEFAULT_TIME_STEP: f32 = 0.02;

/// Number of constraint relaxation passes performed per tick.
pub const DEFAULT_ITERATIONS: u32 = 2;

/// Nodes per side of the spawned cuboid.
pub const DEFAULT_DIM: usize = 5;

/// Rest spacing between face-adjacent nodes.
pub const DEFAULT_DIST_BETWEEN: f32 = 0.1;

/// Separation below which compression constraints engage.
pub const DEFAULT_MIN_DIST: f32 = 0.05;

/// Mass of every node.
pub const DEFAULT_NODE_MASS: f32 = 1.0;

pub const DEFAULT_STIFFNESS: f32 = 0.8;
pub const DEFAULT_PLIABILITY: f32 = 0.2;
pub const DEFAULT_BOUNCINESS: f32 = 0.0;

/// Minimum magnitude a propagated force must keep to travel another hop.
pub const DEFAULT_FORCE_THRESHOLD: f32 = 0.005;

/// Maximum number of contributions a node accepts during one propagation.
pub const DEFAULT_MAX_RECEIVED: u32 = 26;

/// Cone half-angle (degrees) inside which forces propagate.
pub const DEFAULT_ANGLE_OF_TRANSFER: f32 = 70.0;

/// Hard cap on worklist pops per tick.
pub const MAX_PROPAGATION_POPS: usize = 10_000;

/// How stretch constraints turn excess length into a correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StretchPolicy {
    /// Excess length divided by the node's neighbour count.
    #[default]
    Linear,
    /// Correction grows with the square of the excess.
    Quadratic,
}

/// How compression constraints keep nodes apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CompressionPolicy {
    /// Damped blend of live and rest distance.
    #[default]
    Blended,
    /// Swept-point test against the previous prediction that stops tunnelling.
    SweptRigid,
}

/// How bending constraints resist local folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BendingPolicy {
    /// Remembered per-neighbour target offsets blended toward live and rest.
    #[default]
    TargetBlend,
    /// Rotate each live offset onto its rest direction, keeping its length.
    DirectionOnly,
}

/// Parameter surface of a soft body simulation.
///
/// Read at the start of every tick; safe to mutate between ticks.
///
/// ```
/// use soft_lattice::config::SimulationConfig;
/// use glam::Vec3;
///
/// let config = SimulationConfig::default()
///     .with_iterations(4)
///     .with_gravity(Vec3::new(0.0, -9.81, 0.0))
///     .with_stiffness(0.9);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Nodes per side of the spawned cuboid.
    pub dim: usize,
    /// Rest spacing between face-adjacent nodes.
    pub dist_between: f32,
    /// Compression engages below this separation.
    pub min_dist: f32,
    /// Mass of every node.
    pub mass: f32,
    /// Pull back toward the rest configuration, in [0, 1].
    pub stiffness: f32,
    /// Positional give toward the live configuration, in [0, 1].
    pub pliability: f32,
    /// Rotational give of bending targets, in [0, 1].
    pub rotational_pliability: f32,
    /// Body restitution, blended with each surface's own bounciness.
    pub bounciness: f32,
    pub gravity: Vec3,
    /// Relaxation passes per tick (at least 1).
    pub iterations: u32,
    /// Fixed tick length in seconds.
    pub time_step: f32,
    pub force_threshold: f32,
    pub max_received: u32,
    /// Propagation cone half-angle in degrees.
    pub angle_of_transfer: f32,
    pub stretch_policy: StretchPolicy,
    pub compression_policy: CompressionPolicy,
    pub bending_policy: BendingPolicy,
    /// Build one volume constraint per neighbour pair.
    pub volume_constraints: bool,
    /// Recompute the volume correction from the surface mesh every tick.
    pub volume_preservation: bool,
    /// Only pair nodes with volumes they start within this distance of.
    /// `None` pairs every node with every volume.
    pub collision_gate: Option<f32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dim: DEFAULT_DIM,
            dist_between: DEFAULT_DIST_BETWEEN,
            min_dist: DEFAULT_MIN_DIST,
            mass: DEFAULT_NODE_MASS,
            stiffness: DEFAULT_STIFFNESS,
            pliability: DEFAULT_PLIABILITY,
            rotational_pliability: DEFAULT_PLIABILITY,
            bounciness: DEFAULT_BOUNCINESS,
            gravity: Vec3::from_array(DEFAULT_GRAVITY),
            iterations: DEFAULT_ITERATIONS,
            time_step: DEFAULT_TIME_STEP,
            force_threshold: DEFAULT_FORCE_THRESHOLD,
            max_received: DEFAULT_MAX_RECEIVED,
            angle_of_transfer: DEFAULT_ANGLE_OF_TRANSFER,
            stretch_policy: StretchPolicy::default(),
            compression_policy: CompressionPolicy::default(),
            bending_policy: BendingPolicy::default(),
            volume_constraints: false,
            volume_preservation: false,
            collision_gate: None,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    pub fn with_dist_between(mut self, dist_between: f32) -> Self {
        self.dist_between = dist_between;
        self
    }

    pub fn with_min_dist(mut self, min_dist: f32) -> Self {
        self.min_dist = min_dist;
        self
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_stiffness(mut self, stiffness: f32) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn with_pliability(mut self, positional: f32, rotational: f32) -> Self {
        self.pliability = positional;
        self.rotational_pliability = rotational;
        self
    }

    pub fn with_bounciness(mut self, bounciness: f32) -> Self {
        self.bounciness = bounciness;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the relaxation pass count (clamped to at least 1).
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    pub fn with_time_step(mut self, time_step: f32) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_propagation(mut self, threshold: f32, max_received: u32, angle_degrees: f32) -> Self {
        self.force_threshold = threshold;
        self.max_received = max_received;
        self.angle_of_transfer = angle_degrees;
        self
    }

    pub fn with_stretch_policy(mut self, policy: StretchPolicy) -> Self {
        self.stretch_policy = policy;
        self
    }

    pub fn with_compression_policy(mut self, policy: CompressionPolicy) -> Self {
        self.compression_policy = policy;
        self
    }

    pub fn with_bending_policy(mut self, policy: BendingPolicy) -> Self {
        self.bending_policy = policy;
        self
    }

    pub fn with_volume_constraints(mut self, enabled: bool, track_mesh_volume: bool) -> Self {
        self.volume_constraints = enabled;
        self.volume_preservation = track_mesh_volume;
        self
    }

    pub fn with_collision_gate(mut self, gate: Option<f32>) -> Self {
        self.collision_gate = gate;
        self
    }

    /// Weight applied per relaxation pass.
    pub fn step_weight(&self) -> f32 {
        1.0 / self.iterations.max(1) as f32
    }

    /// Propagation cone half-angle in radians.
    pub fn angle_of_transfer_radians(&self) -> f32 {
        self.angle_of_transfer.to_radians()
    }

    /// Blended restitution of the body and a surface.
    pub fn blended_bounciness(&self, surface: f32) -> f32 {
        (self.bounciness + surface) * 0.5
    }

    /// Checks every parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(SimulationError::InvalidMass(self.mass));
        }
        if self.dim == 0 {
            return Err(SimulationError::invalid_config("dim must be at least 1"));
        }
        if !(self.dist_between.is_finite() && self.dist_between > 0.0) {
            return Err(SimulationError::invalid_config(format!(
                "dist_between must be positive, got {}",
                self.dist_between
            )));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(SimulationError::invalid_config(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.iterations == 0 {
            return Err(SimulationError::invalid_config("iterations must be at least 1"));
        }
        if self.min_dist < 0.0 {
            return Err(SimulationError::invalid_config("min_dist must not be negative"));
        }
        for (name, value) in [
            ("stiffness", self.stiffness),
            ("pliability", self.pliability),
            ("rotational_pliability", self.rotational_pliability),
            ("bounciness", self.bounciness),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimulationError::invalid_config(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        if !(0.0..=180.0).contains(&self.angle_of_transfer) {
            return Err(SimulationError::invalid_config(format!(
                "angle_of_transfer must be in [0, 180] degrees, got {}",
                self.angle_of_transfer
            )));
        }
        if self.force_threshold < 0.0 {
            return Err(SimulationError::invalid_config("force_threshold must not be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dim, 5);
        assert!((config.step_weight() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_mass_is_rejected() {
        let config = SimulationConfig::default().with_mass(0.0);
        assert_eq!(config.validate(), Err(SimulationError::InvalidMass(0.0)));
    }

    #[test]
    fn out_of_range_stiffness_is_rejected() {
        let config = SimulationConfig::default().with_stiffness(1.5);
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn iterations_never_drop_below_one() {
        let config = SimulationConfig::default().with_iterations(0);
        assert_eq!(config.iterations, 1);
        assert!((config.step_weight() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn blended_bounciness_averages() {
        let config = SimulationConfig::default().with_bounciness(0.6);
        assert!((config.blended_bounciness(0.2) - 0.4).abs() < 1e-6);
    }
}
