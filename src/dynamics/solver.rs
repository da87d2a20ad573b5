use crate::constraints::{ConstraintSet, SolveContext};
use crate::core::Node;
use crate::utils::{TickPhase, TickProfiler};

/// Jacobi-style relaxation of predicted positions.
///
/// Each pass lets every internal constraint read the previous pass's
/// predictions, then moves every node by its weighted correction.
#[derive(Debug, Clone)]
pub struct ConstraintSolver {
    pub iterations: u32,
}

impl ConstraintSolver {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn step_weight(&self) -> f32 {
        1.0 / self.iterations as f32
    }

    /// Runs the internal passes followed by the single collision clamp,
    /// timing each under its own profiler phase.
    pub fn solve(
        &self,
        nodes: &mut [Node],
        constraints: &mut ConstraintSet,
        ctx: &mut SolveContext<'_>,
        profiler: &mut TickProfiler,
    ) {
        {
            let _phase = profiler.phase(TickPhase::Relax);
            self.relax(nodes, constraints, ctx);
        }
        let _phase = profiler.phase(TickPhase::Collide);
        constraints.apply_external(nodes, ctx);
    }

    pub fn relax(&self, nodes: &mut [Node], constraints: &mut ConstraintSet, ctx: &mut SolveContext<'_>) {
        let weight = self.step_weight();
        for _ in 0..self.iterations {
            constraints.relax_internal(nodes, ctx, weight);
            apply_corrections(nodes, ctx.time_step, weight);
        }
    }
}

/// Moves each prediction by its weighted correction and seeds the next
/// pass's correction from the residual propagation normal.
fn apply_corrections(nodes: &mut [Node], time_step: f32, weight: f32) {
    for node in nodes {
        node.prev_predicted = node.predicted_position;
        node.predicted_position += node.corrected_displacement * weight;
        node.corrected_displacement = node.normal * (time_step * weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::constraints::{Constraint, StaticCollisionConstraint};
    use crate::core::{CollisionVolume, NodeGraph};
    use crate::dynamics::propagation::ForceQueue;
    use crate::utils::TickStats;
    use glam::Vec3;

    #[test]
    fn solve_ends_with_the_collision_clamp() {
        let mut graph = NodeGraph::new();
        graph.add_node(Vec3::new(0.0, 0.05, 0.0), 1.0).unwrap();
        graph.nodes_mut()[0].predicted_position = Vec3::new(0.0, -0.05, 0.0);

        let mut constraints = ConstraintSet::new();
        constraints.push(Constraint::StaticCollision(StaticCollisionConstraint::new(0, 0, Vec3::Y)));
        let mut volumes = vec![CollisionVolume::cuboid(Vec3::new(0.0, -1.0, 0.0), Vec3::ONE)];
        let config = SimulationConfig::default();
        let mut forces = ForceQueue::new(1);
        let mut stats = TickStats::default();
        let mut ctx = SolveContext {
            config: &config,
            time_step: config.time_step,
            volume_correction: 0.0,
            volumes: &mut volumes,
            forces: &mut forces,
            stats: &mut stats,
        };

        let mut profiler = TickProfiler::default();
        profiler.begin(0);
        let solver = ConstraintSolver::new(3);
        solver.solve(graph.nodes_mut(), &mut constraints, &mut ctx, &mut profiler);

        assert!(graph.nodes()[0].predicted_position.y.abs() < 1e-6);
        assert_eq!(stats.contacts, 1);
    }

    #[test]
    fn zero_iterations_still_run_one_pass() {
        let solver = ConstraintSolver::new(0);
        assert_eq!(solver.iterations, 1);
        assert_eq!(solver.step_weight(), 1.0);
    }
}
