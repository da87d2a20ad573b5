use glam::{Quat, Vec3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::SimulationConfig;
use crate::core::Node;
use crate::utils::math::from_to_rotation;

/// Predictor and commit halves of the position-based step.
///
/// Per-node passes optionally run on rayon. Each node only writes its own
/// state, so both paths produce identical results.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub dt: f32,
    parallel: bool,
}

impl Integrator {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            parallel: cfg!(feature = "parallel"),
        }
    }

    /// Has no effect unless the `parallel` feature is compiled in.
    pub fn set_parallel(&mut self, enabled: bool) {
        self.parallel = enabled && cfg!(feature = "parallel");
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    fn for_each_node(&self, nodes: &mut [Node], f: impl Fn(&mut Node) + Send + Sync) {
        #[cfg(feature = "parallel")]
        if self.parallel {
            nodes.par_iter_mut().for_each(f);
            return;
        }
        nodes.iter_mut().for_each(f);
    }

    /// Clears per-tick accumulators.
    pub fn begin_tick(&self, nodes: &mut [Node]) {
        self.for_each_node(nodes, Node::begin_tick);
    }

    /// Applies gravity and the propagated normal, then predicts positions.
    ///
    /// Velocity is zeroed afterwards; the commit re-derives it from the
    /// corrected prediction.
    pub fn predict(&self, nodes: &mut [Node], config: &SimulationConfig) {
        let dt = self.dt;
        let gravity = config.gravity;
        let normal_share = dt * config.step_weight();

        self.for_each_node(nodes, |node| {
            node.external_forces += gravity;
            node.corrected_displacement += node.averaged_normal() * normal_share;
            node.velocity += node.external_forces * (dt * node.inverse_mass());
            node.predicted_position = node.position + node.velocity * dt;
            node.prev_predicted = node.position;

            node.velocity = Vec3::ZERO;
            node.normal = Vec3::ZERO;
            node.normal_count = 0;
        });
    }

    /// Commits predictions to positions and velocities, then re-estimates
    /// each node's orientation from its neighbours.
    pub fn commit(&self, nodes: &mut [Node]) {
        let inv_dt = 1.0 / self.dt;
        self.for_each_node(nodes, |node| {
            node.velocity += (node.predicted_position - node.position) * inv_dt;
            node.position = node.predicted_position;
        });

        let corrections = self.gather_rotations(nodes);
        for (node, corrected) in nodes.iter_mut().zip(corrections) {
            node.corrected_rotation = corrected;
            node.rotation = (corrected * node.rotation).normalize();
        }
    }

    fn gather_rotations(&self, nodes: &[Node]) -> Vec<Quat> {
        #[cfg(feature = "parallel")]
        if self.parallel {
            return nodes.par_iter().map(|node| corrected_rotation(node, nodes)).collect();
        }
        nodes.iter().map(|node| corrected_rotation(node, nodes)).collect()
    }
}

/// Composes the from-to rotations taking each rotated rest offset onto the
/// live offset, in adjacency order.
///
/// Each rotation is scaled down to a 1/neighbour share, so one commit only
/// nudges the orientation toward the neighbourhood average. At full share the
/// last neighbour dominates and bending feeds the error back until a landed
/// body crumples.
fn corrected_rotation(node: &Node, nodes: &[Node]) -> Quat {
    let share = 1.0 / node.neighbor_weight();
    let mut corrected = Quat::IDENTITY;
    for (&near, rest) in node.nearby.iter().zip(&node.rest_offsets) {
        let initial = (corrected * node.rotation) * *rest;
        let current = nodes[near].position - node.position;
        let step = Quat::IDENTITY.slerp(from_to_rotation(initial, current), share);
        corrected = (step * corrected).normalize();
    }
    corrected
}
