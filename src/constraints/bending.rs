use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::SolveContext;
use crate::config::BendingPolicy;
use crate::core::Node;
use crate::utils::math::rotate_onto;

/// Resists local folding around one node.
///
/// Keeps a target offset per neighbour. Every call blends each target toward
/// the live offset (rotational pliability) and then toward the rest offset
/// carried by the node's orientation (stiffness). The node is moved by the
/// mean gap between live offsets and targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BendingConstraint {
    pub node: usize,
    rest_offsets: Vec<Vec3>,
    initial_offsets: Vec<Vec3>,
    targets: Vec<Vec3>,
}

impl BendingConstraint {
    pub fn new(nodes: &[Node], node: usize) -> Self {
        let rest = nodes[node].rest_offsets.clone();
        Self {
            node,
            targets: rest.clone(),
            initial_offsets: rest.clone(),
            rest_offsets: rest,
        }
    }

    pub fn targets(&self) -> &[Vec3] {
        &self.targets
    }

    pub fn constrain_positions(&mut self, nodes: &mut [Node], ctx: &mut SolveContext<'_>, _step_weight: f32) {
        let node = &nodes[self.node];
        let count = node.neighbor_weight();
        let origin = node.predicted_position;
        let rotation = node.rotation;
        let config = ctx.config;

        let mut gap = Vec3::ZERO;
        for (k, &near) in node.nearby.iter().enumerate() {
            let current = nodes[near].predicted_position - origin;
            let rest = rotation * self.rest_offsets[k];
            match config.bending_policy {
                BendingPolicy::TargetBlend => {
                    let target = &mut self.targets[k];
                    *target = target.lerp(current, config.rotational_pliability);
                    *target = target.lerp(rest, config.stiffness);
                    gap += current - *target;
                }
                BendingPolicy::DirectionOnly => {
                    gap += current - rotate_onto(current, rest);
                }
            }
        }

        if !gap.is_finite() {
            ctx.stats.degenerate_pairs += 1;
            return;
        }
        nodes[self.node].corrected_displacement += gap / count;
    }

    /// Adopts the committed neighbour offsets, expressed in the node's frame.
    pub fn update_initial(&mut self, nodes: &[Node]) {
        let node = &nodes[self.node];
        let inverse = node.rotation.inverse();
        for (k, &near) in node.nearby.iter().enumerate() {
            let offset = nodes[near].position - node.position;
            self.rest_offsets[k] = inverse * offset;
            self.targets[k] = offset;
        }
    }

    pub fn reset(&mut self) {
        self.rest_offsets.clone_from(&self.initial_offsets);
        self.targets.clone_from(&self.initial_offsets);
    }
}
