use serde::{Deserialize, Serialize};

use super::SolveContext;
use crate::config::CompressionPolicy;
use crate::core::Node;
use crate::utils::math::{direction, lerp, project};

/// Keeps `node` at least `min_dist` away from `other`.
///
/// The blended policy remembers a target separation between calls: each
/// call drags it toward the live distance by the pliability, then back
/// toward the rest distance by the stiffness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConstraint {
    pub node: usize,
    pub other: usize,
    rest_distance: f32,
    target_distance: f32,
    initial_rest_distance: f32,
}

impl CompressionConstraint {
    pub fn new(nodes: &[Node], node: usize, other: usize) -> Self {
        let rest = nodes[node].position.distance(nodes[other].position);
        Self {
            node,
            other,
            rest_distance: rest,
            target_distance: rest,
            initial_rest_distance: rest,
        }
    }

    pub fn rest_distance(&self) -> f32 {
        self.rest_distance
    }

    pub fn target_distance(&self) -> f32 {
        self.target_distance
    }

    pub fn constrain_positions(&mut self, nodes: &mut [Node], ctx: &mut SolveContext<'_>, step_weight: f32) {
        let offset = nodes[self.node].predicted_position - nodes[self.other].predicted_position;
        let distance = offset.length();
        if distance >= ctx.config.min_dist {
            return;
        }
        let Some(dir) = direction(offset) else {
            ctx.stats.degenerate_pairs += 1;
            return;
        };

        match ctx.config.compression_policy {
            CompressionPolicy::Blended => {
                self.target_distance = lerp(self.target_distance, distance, ctx.config.pliability);
                self.target_distance = lerp(self.target_distance, self.rest_distance, ctx.config.stiffness);
                let node = &mut nodes[self.node];
                let push = dir * (self.target_distance - distance);
                node.corrected_displacement += push / node.neighbor_weight() * 2.0;
            }
            CompressionPolicy::SweptRigid => {
                self.swept_stop(nodes, ctx, step_weight);
            }
        }
    }

    /// Stops the node where its path from the previous prediction first came
    /// within `min_dist` of the other node.
    fn swept_stop(&self, nodes: &mut [Node], ctx: &mut SolveContext<'_>, step_weight: f32) {
        let min_dist = ctx.config.min_dist;
        let previous = nodes[self.node].prev_predicted;
        let predicted = nodes[self.node].predicted_position;
        let other = nodes[self.other].predicted_position;

        let back = previous - predicted;
        let Some(back_dir) = direction(back) else {
            ctx.stats.degenerate_pairs += 1;
            return;
        };

        let closest = previous + project(other - previous, back);
        let closest_distance = other.distance(closest);
        if closest.distance(predicted) > back.length() || closest_distance >= min_dist {
            return;
        }

        let to_closest = predicted.distance(closest);
        let closest_to_min = (min_dist * min_dist - closest_distance * closest_distance).abs().sqrt();
        let stop = back_dir * (to_closest + closest_to_min);
        nodes[self.node].corrected_displacement += stop * step_weight;
    }

    pub fn update_initial(&mut self, nodes: &[Node]) {
        self.rest_distance = nodes[self.node].position.distance(nodes[self.other].position);
        self.target_distance = self.rest_distance;
    }

    pub fn reset(&mut self) {
        self.rest_distance = self.initial_rest_distance;
        self.target_distance = self.initial_rest_distance;
    }
}
