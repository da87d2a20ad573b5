use serde::{Deserialize, Serialize};

use super::SolveContext;
use crate::core::Node;
use crate::utils::math::direction;

/// Pushes a neighbour pair apart (or together) by the shared volume
/// correction scalar. Inert while the scalar is zero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VolumeConstraint {
    pub node: usize,
    pub other: usize,
}

impl VolumeConstraint {
    pub fn new(node: usize, other: usize) -> Self {
        Self { node, other }
    }

    pub fn constrain_positions(&mut self, nodes: &mut [Node], ctx: &mut SolveContext<'_>, _step_weight: f32) {
        if ctx.volume_correction == 0.0 {
            return;
        }
        let offset = nodes[self.node].predicted_position - nodes[self.other].predicted_position;
        let Some(dir) = direction(offset) else {
            ctx.stats.degenerate_pairs += 1;
            return;
        };
        nodes[self.node].corrected_displacement += dir * ctx.volume_correction;
    }
}
