//! Directional cutoff diffusion of injected forces across the lattice.
//!
//! A force lands on one node as an accumulated "normal". Popping that node
//! projects its averaged normal onto every neighbour direction that lies
//! inside the transfer cone; projections above the threshold travel on and
//! shrink with every hop until they fall below it or the receiver saturates.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::Vec3;
use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::{SimulationConfig, MAX_PROPAGATION_POPS};
use crate::core::Node;
use crate::utils::math::{angle_between, direction, project};

/// Outcome of one propagation run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationStats {
    pub pops: usize,
    /// Propagation stopped at the pop cap with work still queued.
    pub cap_reached: bool,
}

impl PropagationStats {
    pub fn merge(&mut self, other: &Self) {
        self.pops += other.pops;
        self.cap_reached |= other.cap_reached;
    }
}

/// FIFO worklist of node indices plus a parallel membership flag per node.
#[derive(Debug, Clone, Default)]
pub struct ForceQueue {
    queue: VecDeque<usize>,
    queued: Vec<bool>,
}

impl ForceQueue {
    pub fn new(node_count: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(node_count),
            queued: vec![false; node_count],
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_queued(&self, index: usize) -> bool {
        self.queued.get(index).copied().unwrap_or(false)
    }

    /// Drops every pending entry.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.queued.iter_mut().for_each(|q| *q = false);
    }

    fn enqueue(&mut self, index: usize) {
        if index >= self.queued.len() {
            self.queued.resize(index + 1, false);
        }
        if !self.queued[index] {
            self.queued[index] = true;
            self.queue.push_back(index);
        }
    }

    /// Accumulates `force` into a node's normal and queues the node when the
    /// force is strong enough to spread. Out-of-range indices are ignored.
    pub fn add_force(&mut self, nodes: &mut [Node], index: usize, force: Vec3, threshold: f32) {
        let Some(node) = nodes.get_mut(index) else {
            return;
        };
        node.normal += force;
        node.normal_count += 1;
        if force.length() > threshold {
            self.enqueue(index);
        }
    }

    /// Drains the worklist, bounded by [`MAX_PROPAGATION_POPS`].
    ///
    /// Entries left behind when the cap trips stay queued for the next call.
    pub fn propagate(&mut self, nodes: &mut [Node], config: &SimulationConfig) -> PropagationStats {
        let mut stats = PropagationStats::default();
        let cutoff = config.angle_of_transfer_radians();
        let threshold = config.force_threshold;

        while !self.queue.is_empty() {
            if stats.pops >= MAX_PROPAGATION_POPS {
                stats.cap_reached = true;
                warn!(
                    "force propagation hit the {MAX_PROPAGATION_POPS} pop cap with {} nodes still queued",
                    self.queue.len()
                );
                break;
            }
            let Some(current) = self.queue.pop_front() else {
                break;
            };
            stats.pops += 1;
            self.queued[current] = false;

            let source = &nodes[current];
            if source.normal_count == 0 {
                continue;
            }
            let source_normal = source.normal;
            let averaged = source.averaged_normal();
            let source_position = source.position;

            // Indexed loop: neighbours are mutated while the source is read.
            for k in 0..nodes[current].nearby.len() {
                let near = nodes[current].nearby[k];
                let Some(dir) = direction(nodes[near].position - source_position) else {
                    continue;
                };
                match angle_between(dir, source_normal) {
                    Some(angle) if angle <= cutoff => {}
                    _ => continue,
                }

                let transfer = project(averaged, dir);
                let receiver = &mut nodes[near];
                if transfer.length() > threshold && receiver.normal_count < config.max_received {
                    receiver.normal += transfer;
                    receiver.normal_count += 1;
                    self.enqueue(near);
                }
            }
        }

        stats
    }
}

/// Thread-safe mailbox for forces produced outside the simulation thread.
///
/// Clones share one buffer. The simulation drains it at the start of every
/// tick, so injected forces never race the solve.
#[derive(Debug, Clone, Default)]
pub struct ForceInbox {
    pending: Arc<Mutex<Vec<(usize, Vec3)>>>,
}

impl ForceInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, node: usize, force: Vec3) {
        self.pending.lock().push((node, force));
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Takes every pending force, leaving the inbox empty.
    pub fn drain(&self) -> Vec<(usize, Vec3)> {
        std::mem::take(&mut *self.pending.lock())
    }
}
