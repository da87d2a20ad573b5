use serde::{Deserialize, Serialize};

use super::SolveContext;
use crate::config::StretchPolicy;
use crate::core::Node;
use crate::utils::math::direction;

/// Pulls `node` back toward `other` once the pair is longer than at rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StretchConstraint {
    pub node: usize,
    pub other: usize,
    rest_distance: f32,
    initial_rest_distance: f32,
}

impl StretchConstraint {
    pub fn new(nodes: &[Node], node: usize, other: usize) -> Self {
        let rest = nodes[node].position.distance(nodes[other].position);
        Self {
            node,
            other,
            rest_distance: rest,
            initial_rest_distance: rest,
        }
    }

    pub fn rest_distance(&self) -> f32 {
        self.rest_distance
    }

    pub fn constrain_positions(&mut self, nodes: &mut [Node], ctx: &mut SolveContext<'_>, _step_weight: f32) {
        let offset = nodes[self.node].predicted_position - nodes[self.other].predicted_position;
        let distance = offset.length();
        if distance <= self.rest_distance {
            return;
        }
        let Some(dir) = direction(offset) else {
            ctx.stats.degenerate_pairs += 1;
            return;
        };

        let excess = distance - self.rest_distance;
        let node = &mut nodes[self.node];
        let correction = match ctx.config.stretch_policy {
            StretchPolicy::Linear => dir * excess / node.neighbor_weight(),
            StretchPolicy::Quadratic => dir * excess * excess,
        };
        node.corrected_displacement -= correction;
    }

    pub fn update_initial(&mut self, nodes: &[Node]) {
        self.rest_distance = nodes[self.node].position.distance(nodes[self.other].position);
    }

    pub fn reset(&mut self) {
        self.rest_distance = self.initial_rest_distance;
    }
}
