//! Position-based constraints and their data-oriented storage.
//!
//! Every constraint reads predicted positions and adds into the governed
//! node's `corrected_displacement`. Calling one twice adds twice.

pub mod bending;
pub mod collision;
pub mod compression;
pub mod stretch;
pub mod volume;

pub use bending::BendingConstraint;
pub use collision::StaticCollisionConstraint;
pub use compression::CompressionConstraint;
pub use stretch::StretchConstraint;
pub use volume::VolumeConstraint;

use log::debug;

use crate::config::SimulationConfig;
use crate::core::{CollisionVolume, Node};
use crate::dynamics::propagation::ForceQueue;
use crate::utils::TickStats;

/// Mutable state shared by constraints during one solve.
pub struct SolveContext<'a> {
    pub config: &'a SimulationConfig,
    pub time_step: f32,
    /// Scalar consumed by volume constraints.
    pub volume_correction: f32,
    pub volumes: &'a mut [CollisionVolume],
    pub forces: &'a mut ForceQueue,
    pub stats: &'a mut TickStats,
}

/// Closed set of constraint kinds.
#[derive(Debug, Clone)]
pub enum Constraint {
    Stretch(StretchConstraint),
    Compression(CompressionConstraint),
    Bending(BendingConstraint),
    StaticCollision(StaticCollisionConstraint),
    Volume(VolumeConstraint),
}

impl Constraint {
    pub fn constrain_positions(&mut self, nodes: &mut [Node], ctx: &mut SolveContext<'_>, step_weight: f32) {
        match self {
            Constraint::Stretch(c) => c.constrain_positions(nodes, ctx, step_weight),
            Constraint::Compression(c) => c.constrain_positions(nodes, ctx, step_weight),
            Constraint::Bending(c) => c.constrain_positions(nodes, ctx, step_weight),
            Constraint::StaticCollision(c) => c.constrain_positions(nodes, ctx, step_weight),
            Constraint::Volume(c) => c.constrain_positions(nodes, ctx, step_weight),
        }
    }

    /// Re-captures rest state from committed positions.
    pub fn update_initial(&mut self, nodes: &[Node]) {
        match self {
            Constraint::Stretch(c) => c.update_initial(nodes),
            Constraint::Compression(c) => c.update_initial(nodes),
            Constraint::Bending(c) => c.update_initial(nodes),
            Constraint::StaticCollision(_) | Constraint::Volume(_) => {}
        }
    }

    /// Restores the rest state captured at construction.
    pub fn reset(&mut self) {
        match self {
            Constraint::Stretch(c) => c.reset(),
            Constraint::Compression(c) => c.reset(),
            Constraint::Bending(c) => c.reset(),
            Constraint::StaticCollision(_) | Constraint::Volume(_) => {}
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Constraint::StaticCollision(_))
    }
}

/// One array per constraint kind, walked in a fixed order.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    stretch: Vec<StretchConstraint>,
    compression: Vec<CompressionConstraint>,
    bending: Vec<BendingConstraint>,
    volume: Vec<VolumeConstraint>,
    collision: Vec<StaticCollisionConstraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, constraint: Constraint) {
        match constraint {
            Constraint::Stretch(c) => self.stretch.push(c),
            Constraint::Compression(c) => self.compression.push(c),
            Constraint::Bending(c) => self.bending.push(c),
            Constraint::StaticCollision(c) => self.collision.push(c),
            Constraint::Volume(c) => self.volume.push(c),
        }
    }

    /// Builds stretch, compression and optional volume constraints for every
    /// ordered neighbour pair, then one bending constraint per node.
    pub fn generate_internal(&mut self, nodes: &[Node], config: &SimulationConfig) {
        for node in nodes {
            for &near in &node.nearby {
                self.push(Constraint::Stretch(StretchConstraint::new(nodes, node.index, near)));
                self.push(Constraint::Compression(CompressionConstraint::new(
                    nodes, node.index, near,
                )));
                if config.volume_constraints {
                    self.push(Constraint::Volume(VolumeConstraint::new(node.index, near)));
                }
            }
        }
        for node in nodes {
            self.push(Constraint::Bending(BendingConstraint::new(nodes, node.index)));
        }

        debug!(
            "generated {} stretch, {} compression, {} bending, {} volume constraints",
            self.stretch.len(),
            self.compression.len(),
            self.bending.len(),
            self.volume.len()
        );
    }

    /// Pairs eligible nodes with the volume at `volume_index`.
    ///
    /// With a gate, only nodes starting within `gate` of the volume's bounds
    /// are paired. Returns the number of constraints added.
    pub fn generate_external(
        &mut self,
        nodes: &[Node],
        volume: &CollisionVolume,
        volume_index: usize,
        gate: Option<f32>,
    ) -> usize {
        let bounds = gate.map(|margin| volume.bounds().expanded(margin));
        let before = self.collision.len();
        for node in nodes {
            if bounds.is_some_and(|b| !b.contains(node.position)) {
                continue;
            }
            let approach = volume.outward_normal(node.position);
            self.push(Constraint::StaticCollision(StaticCollisionConstraint::new(
                node.index,
                volume_index,
                approach,
            )));
        }
        let added = self.collision.len() - before;
        debug!("paired {added} nodes with collision volume {volume_index}");
        added
    }

    /// One pass over every internal constraint.
    pub fn relax_internal(&mut self, nodes: &mut [Node], ctx: &mut SolveContext<'_>, step_weight: f32) {
        for c in &mut self.stretch {
            c.constrain_positions(nodes, ctx, step_weight);
        }
        for c in &mut self.compression {
            c.constrain_positions(nodes, ctx, step_weight);
        }
        for c in &mut self.bending {
            c.constrain_positions(nodes, ctx, step_weight);
        }
        if ctx.volume_correction != 0.0 {
            for c in &mut self.volume {
                c.constrain_positions(nodes, ctx, step_weight);
            }
        }
    }

    /// Final collision clamp, applied once with zero blending weight.
    pub fn apply_external(&mut self, nodes: &mut [Node], ctx: &mut SolveContext<'_>) {
        for c in &mut self.collision {
            c.constrain_positions(nodes, ctx, 0.0);
        }
    }

    pub fn update_initial(&mut self, nodes: &[Node]) {
        self.stretch.iter_mut().for_each(|c| c.update_initial(nodes));
        self.compression.iter_mut().for_each(|c| c.update_initial(nodes));
        self.bending.iter_mut().for_each(|c| c.update_initial(nodes));
    }

    pub fn reset(&mut self) {
        self.stretch.iter_mut().for_each(StretchConstraint::reset);
        self.compression.iter_mut().for_each(CompressionConstraint::reset);
        self.bending.iter_mut().for_each(BendingConstraint::reset);
    }

    pub fn internal_count(&self) -> usize {
        self.stretch.len() + self.compression.len() + self.bending.len() + self.volume.len()
    }

    pub fn external_count(&self) -> usize {
        self.collision.len()
    }

    pub fn stretch(&self) -> &[StretchConstraint] {
        &self.stretch
    }

    pub fn compression(&self) -> &[CompressionConstraint] {
        &self.compression
    }

    pub fn bending(&self) -> &[BendingConstraint] {
        &self.bending
    }

    pub fn volume(&self) -> &[VolumeConstraint] {
        &self.volume
    }

    pub fn collision(&self) -> &[StaticCollisionConstraint] {
        &self.collision
    }
}
