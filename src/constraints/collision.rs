use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::SolveContext;
use crate::core::Node;
use crate::utils::math::{direction, project_on_plane};

/// Keeps one node out of one collision volume.
///
/// When the predicted position is inside, the node is placed on the volume's
/// boundary, its slide is reduced by friction, and it inherits the volume's
/// own motion for this tick. Massive volumes receive the opposite impulse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StaticCollisionConstraint {
    pub node: usize,
    pub volume: usize,
    /// Outward normal seen from the node's position at pairing time.
    approach_normal: Vec3,
}

impl StaticCollisionConstraint {
    pub fn new(node: usize, volume: usize, approach_normal: Vec3) -> Self {
        Self {
            node,
            volume,
            approach_normal: direction(approach_normal).unwrap_or(Vec3::Y),
        }
    }

    pub fn approach_normal(&self) -> Vec3 {
        self.approach_normal
    }

    pub fn constrain_positions(&mut self, nodes: &mut [Node], ctx: &mut SolveContext<'_>, _step_weight: f32) {
        let Some(volume) = ctx.volumes.get_mut(self.volume) else {
            return;
        };
        let predicted = nodes[self.node].predicted_position;
        let Some(contact) = volume.contact(predicted) else {
            return;
        };

        let normal = if volume.sticking {
            self.approach_normal
        } else {
            contact.normal
        };

        // The boundary point already sits on the moved surface, so only the
        // tangential part of the surface motion is carried explicitly.
        let tangent_move = project_on_plane(volume.delta(), normal);
        let tangent_scale = if volume.sticking { 1.0 } else { volume.friction };
        let boundary = if volume.sticking {
            volume.push_out_along(predicted, normal)
        } else {
            contact.boundary_point
        };

        let node = &mut nodes[self.node];
        let incoming = node.predicted_position - node.position;
        node.velocity = Vec3::ZERO;

        let slip = project_on_plane(incoming, normal);
        let reduction = (volume.friction * contact.depth).min(slip.length());
        let slip_back = direction(slip).map_or(Vec3::ZERO, |dir| dir * reduction);
        node.predicted_position = boundary - slip_back + tangent_move * tangent_scale;

        if volume.is_massive() {
            let approach_speed = incoming.dot(normal) / ctx.time_step;
            if approach_speed < 0.0 {
                volume.apply_impulse(normal * node.mass() * approach_speed);
            }
        }

        let bounce = -node.external_forces * ctx.config.blended_bounciness(volume.bounciness);
        if bounce != Vec3::ZERO {
            ctx.forces.add_force(nodes, self.node, bounce, ctx.config.force_threshold);
        }
        ctx.stats.contacts += 1;
    }
}
