use std::time::{Duration, Instant};

use log::{log_enabled, warn, Level};
use serde::{Deserialize, Serialize};

use crate::dynamics::propagation::PropagationStats;

/// Counters gathered over one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    pub propagation: PropagationStats,
    /// Static collision constraints that found their node inside a volume.
    pub contacts: usize,
    /// Constraint pairs skipped because their direction was degenerate.
    pub degenerate_pairs: usize,
}

impl TickStats {
    pub fn merge(&mut self, other: &Self) {
        self.propagation.merge(&other.propagation);
        self.contacts += other.contacts;
        self.degenerate_pairs += other.degenerate_pairs;
    }
}

/// The timed stages of one tick, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    Reset,
    Propagate,
    Integrate,
    Relax,
    Collide,
    Commit,
    Mesh,
}

impl TickPhase {
    pub fn label(self) -> &'static str {
        match self {
            TickPhase::Reset => "reset",
            TickPhase::Propagate => "propagate",
            TickPhase::Integrate => "integrate",
            TickPhase::Relax => "relax",
            TickPhase::Collide => "collide",
            TickPhase::Commit => "commit",
            TickPhase::Mesh => "mesh",
        }
    }
}

/// Per-phase wall-clock timings of the most recent tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickProfiler {
    tick: u64,
    pub reset_time: Duration,
    pub propagation_time: Duration,
    pub integrate_time: Duration,
    pub relaxation_time: Duration,
    pub collision_time: Duration,
    pub commit_time: Duration,
    pub mesh_time: Duration,
    pub total_time: Duration,
}

impl TickProfiler {
    /// Clears every slot and tags later phase traces with `tick`.
    pub fn begin(&mut self, tick: u64) {
        *self = Self {
            tick,
            ..Self::default()
        };
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Starts timing `phase`. The elapsed time is added to its slot when the
    /// returned guard drops.
    pub fn phase(&mut self, phase: TickPhase) -> PhaseTimer<'_> {
        let tick = self.tick;
        PhaseTimer {
            tick,
            phase,
            start: Instant::now(),
            output: self.slot_mut(phase),
        }
    }

    pub fn phase_time(&self, phase: TickPhase) -> Duration {
        match phase {
            TickPhase::Reset => self.reset_time,
            TickPhase::Propagate => self.propagation_time,
            TickPhase::Integrate => self.integrate_time,
            TickPhase::Relax => self.relaxation_time,
            TickPhase::Collide => self.collision_time,
            TickPhase::Commit => self.commit_time,
            TickPhase::Mesh => self.mesh_time,
        }
    }

    fn slot_mut(&mut self, phase: TickPhase) -> &mut Duration {
        match phase {
            TickPhase::Reset => &mut self.reset_time,
            TickPhase::Propagate => &mut self.propagation_time,
            TickPhase::Integrate => &mut self.integrate_time,
            TickPhase::Relax => &mut self.relaxation_time,
            TickPhase::Collide => &mut self.collision_time,
            TickPhase::Commit => &mut self.commit_time,
            TickPhase::Mesh => &mut self.mesh_time,
        }
    }

    /// Logs the breakdown at debug level.
    pub fn report(&self) {
        let total_us = self.total_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        let share = |d: Duration| (d.as_micros() as f32 / total_us) * 100.0;
        log::debug!(
            "tick {} took {:.3} ms | reset {:.1}% propagate {:.1}% integrate {:.1}% relax {:.1}% collide {:.1}% commit {:.1}% mesh {:.1}%",
            self.tick,
            self.total_time.as_secs_f32() * 1000.0,
            share(self.reset_time),
            share(self.propagation_time),
            share(self.integrate_time),
            share(self.relaxation_time),
            share(self.collision_time),
            share(self.commit_time),
            share(self.mesh_time),
        );
    }

    /// Warns when the whole tick took longer than the simulated time it
    /// covers. Returns whether it did.
    pub fn warn_if_over_budget(&self, time_step: f32) -> bool {
        let elapsed_ms = self.total_time.as_secs_f32() * 1000.0;
        let budget_ms = time_step * 1000.0;
        if elapsed_ms > budget_ms {
            warn!(
                "tick {} ran {elapsed_ms:.2} ms, longer than its {budget_ms:.2} ms step",
                self.tick
            );
            return true;
        }
        false
    }
}

/// Guard adding the elapsed time of one tick phase onto its profiler slot.
pub struct PhaseTimer<'a> {
    tick: u64,
    phase: TickPhase,
    start: Instant,
    output: &'a mut Duration,
}

impl Drop for PhaseTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        *self.output += elapsed;
        if log_enabled!(Level::Trace) {
            log::trace!(
                "tick {} {}: {} µs",
                self.tick,
                self.phase.label(),
                elapsed.as_micros()
            );
        }
    }
}
