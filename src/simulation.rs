//! Tick orchestration for one soft body.

use std::time::Instant;

use glam::Vec3;
use log::{debug, warn};

use crate::{
    collision::queries::{NodeRayHit, Raycast, RaycastQuery},
    config::{SimulationConfig, DEFAULT_TIME_STEP},
    constraints::{ConstraintSet, SolveContext},
    core::{CollisionVolume, Node, NodeGraph},
    dynamics::{
        integrator::Integrator,
        propagation::{ForceInbox, ForceQueue, PropagationStats},
        solver::ConstraintSolver,
    },
    error::{Result, SimulationError},
    mesh::SurfaceMesh,
    utils::{TickPhase, TickProfiler, TickStats},
};

/// A deformable lattice body with its constraints, collision volumes and
/// boundary mesh.
///
/// Owns every node for the duration of a tick. Other threads inject forces
/// through a [`ForceInbox`], which is drained at the start of each tick.
pub struct Simulation {
    config: SimulationConfig,
    graph: NodeGraph,
    constraints: ConstraintSet,
    volumes: Vec<CollisionVolume>,
    forces: ForceQueue,
    inbox: ForceInbox,
    integrator: Integrator,
    solver: ConstraintSolver,
    mesh: SurfaceMesh,
    initial_volume: f32,
    volume_correction: f32,
    time_accumulated: f32,
    tick_count: u64,
    last_stats: TickStats,
    total_stats: TickStats,
    profiler: TickProfiler,
}

impl Simulation {
    /// Spawns a `config.dim`³ lattice centred on the origin.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::spawn_at(config, Vec3::ZERO)
    }

    pub fn spawn_at(config: SimulationConfig, origin: Vec3) -> Result<Self> {
        config.validate()?;
        let graph = NodeGraph::cuboid(config.dim, config.dist_between, config.mass, origin)?;
        Self::from_graph(graph, config)
    }

    /// Wraps an existing graph. Fails when the graph is empty or its surface
    /// cannot be meshed.
    pub fn from_graph(graph: NodeGraph, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        if graph.is_empty() {
            return Err(SimulationError::EmptyLattice);
        }

        let mesh = SurfaceMesh::generate(&graph)?;
        let mut constraints = ConstraintSet::new();
        constraints.generate_internal(graph.nodes(), &config);
        let initial_volume = mesh.volume();

        debug!(
            "soft body ready: {} nodes, {} internal constraints, volume {initial_volume:.5}",
            graph.len(),
            constraints.internal_count()
        );

        Ok(Self {
            forces: ForceQueue::new(graph.len()),
            inbox: ForceInbox::new(),
            integrator: Integrator::new(config.time_step),
            solver: ConstraintSolver::new(config.iterations),
            config,
            graph,
            constraints,
            volumes: Vec::new(),
            mesh,
            initial_volume,
            volume_correction: 0.0,
            time_accumulated: 0.0,
            tick_count: 0,
            last_stats: TickStats::default(),
            total_stats: TickStats::default(),
            profiler: TickProfiler::default(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Parameters are re-read at the start of every tick.
    pub fn config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    pub fn set_parallel_enabled(&mut self, enabled: bool) {
        self.integrator.set_parallel(enabled);
    }

    pub fn parallel_enabled(&self) -> bool {
        self.integrator.is_parallel()
    }

    pub fn nodes(&self) -> &[Node] {
        self.graph.nodes()
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.graph.node(index)
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn mesh(&self) -> &SurfaceMesh {
        &self.mesh
    }

    /// Enclosed volume of the boundary mesh as of the last commit.
    pub fn mesh_volume(&self) -> f32 {
        self.mesh.volume()
    }

    /// Mesh volume captured at spawn or by the last rest-state update.
    pub fn initial_volume(&self) -> f32 {
        self.initial_volume
    }

    pub fn volume_correction(&self) -> f32 {
        self.volume_correction
    }

    /// Sets the scalar volume constraints push with. Overwritten every tick
    /// while volume preservation is enabled.
    pub fn set_volume_correction(&mut self, correction: f32) {
        self.volume_correction = correction;
    }

    pub fn last_stats(&self) -> &TickStats {
        &self.last_stats
    }

    /// Counters summed over every tick since construction.
    pub fn total_stats(&self) -> &TickStats {
        &self.total_stats
    }

    pub fn profiler(&self) -> &TickProfiler {
        &self.profiler
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Handle other threads can use to queue forces for the next tick.
    pub fn force_inbox(&self) -> ForceInbox {
        self.inbox.clone()
    }

    /// Adds a volume and pairs it with eligible nodes. Returns its index.
    pub fn add_collision_volume(&mut self, volume: CollisionVolume) -> usize {
        let index = self.volumes.len();
        self.constraints
            .generate_external(self.graph.nodes(), &volume, index, self.config.collision_gate);
        self.volumes.push(volume);
        index
    }

    pub fn collision_volumes(&self) -> &[CollisionVolume] {
        &self.volumes
    }

    /// Mutable access for moving a volume between ticks.
    pub fn collision_volume_mut(&mut self, index: usize) -> Option<&mut CollisionVolume> {
        self.volumes.get_mut(index)
    }

    /// Accumulates a force on one node, queueing it for propagation when it
    /// exceeds the force threshold.
    pub fn add_force(&mut self, node: usize, force: Vec3) -> Result<()> {
        let count = self.graph.len();
        if node >= count {
            return Err(SimulationError::NodeOutOfBounds { index: node, count });
        }
        self.forces
            .add_force(self.graph.nodes_mut(), node, force, self.config.force_threshold);
        Ok(())
    }

    /// Applies `force` to every surface node whose distance from `center`
    /// lies strictly between `min` and `max`. Returns how many were hit.
    pub fn add_force_in_range(&mut self, center: Vec3, min: f32, max: f32, force: Vec3) -> usize {
        let threshold = self.config.force_threshold;
        let mut applied = 0;
        for k in 0..self.graph.surface_nodes().len() {
            let index = self.graph.surface_nodes()[k];
            let distance = self.graph.nodes()[index].position.distance(center);
            if distance > min && distance < max {
                self.forces
                    .add_force(self.graph.nodes_mut(), index, force, threshold);
                applied += 1;
            }
        }
        applied
    }

    /// Spreads every queued force now instead of waiting for the next tick.
    pub fn propagate_queued_forces(&mut self) -> PropagationStats {
        self.forces.propagate(self.graph.nodes_mut(), &self.config)
    }

    pub fn closest_surface_node_to_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<NodeRayHit> {
        let query = RaycastQuery::new(origin, direction, max_distance);
        Raycast::closest_surface_node(&query, self.graph.nodes(), self.graph.surface_nodes())
    }

    /// Advances by `dt` seconds of wall time in fixed ticks. Returns the
    /// number of ticks taken.
    ///
    /// Negative or non-finite `dt` is ignored and leaves the accumulator
    /// untouched.
    pub fn advance(&mut self, dt: f32) -> usize {
        if !(dt.is_finite() && dt >= 0.0) {
            warn!("ignoring invalid frame time {dt}");
            return 0;
        }
        let step = self.time_step();
        self.time_accumulated += dt;
        let mut ticks = 0;
        while self.time_accumulated >= step {
            self.time_accumulated -= step;
            self.step();
            ticks += 1;
        }
        ticks
    }

    fn time_step(&self) -> f32 {
        if self.config.time_step.is_finite() && self.config.time_step > 0.0 {
            self.config.time_step
        } else {
            DEFAULT_TIME_STEP
        }
    }

    /// Runs one fixed tick.
    pub fn step(&mut self) {
        let tick_start = Instant::now();
        self.profiler.begin(self.tick_count);
        let mut stats = TickStats::default();

        let dt = self.time_step();
        self.integrator.dt = dt;
        self.solver.iterations = self.config.iterations.max(1);

        self.drain_inbox();
        for volume in &mut self.volumes {
            volume.integrate(dt);
        }

        {
            let _phase = self.profiler.phase(TickPhase::Reset);
            self.integrator.begin_tick(self.graph.nodes_mut());
        }
        {
            let _phase = self.profiler.phase(TickPhase::Propagate);
            stats.propagation = self.forces.propagate(self.graph.nodes_mut(), &self.config);
        }

        if self.config.volume_preservation {
            self.volume_correction = self.preservation_correction();
        }

        {
            let _phase = self.profiler.phase(TickPhase::Integrate);
            self.integrator.predict(self.graph.nodes_mut(), &self.config);
        }

        let mut ctx = SolveContext {
            config: &self.config,
            time_step: dt,
            volume_correction: self.volume_correction,
            volumes: &mut self.volumes,
            forces: &mut self.forces,
            stats: &mut stats,
        };
        self.solver.solve(
            self.graph.nodes_mut(),
            &mut self.constraints,
            &mut ctx,
            &mut self.profiler,
        );

        {
            let _phase = self.profiler.phase(TickPhase::Commit);
            self.integrator.commit(self.graph.nodes_mut());
        }
        for volume in &mut self.volumes {
            volume.end_tick();
        }

        {
            let _phase = self.profiler.phase(TickPhase::Mesh);
            self.mesh.update(self.graph.nodes(), self.graph.origin());
        }

        if stats.propagation.cap_reached {
            debug!("tick {}: propagation left {} nodes queued", self.tick_count, self.forces.len());
        }

        self.profiler.total_time = tick_start.elapsed();
        self.profiler.report();
        self.profiler.warn_if_over_budget(dt);

        self.total_stats.merge(&stats);
        self.last_stats = stats;
        self.tick_count += 1;
    }

    fn drain_inbox(&mut self) {
        let threshold = self.config.force_threshold;
        let count = self.graph.len();
        for (node, force) in self.inbox.drain() {
            if node >= count {
                warn!("dropping injected force for node {node}: only {count} nodes");
                continue;
            }
            self.forces
                .add_force(self.graph.nodes_mut(), node, force, threshold);
        }
    }

    /// Per-node push that would restore the initial mesh volume.
    fn preservation_correction(&self) -> f32 {
        let current = self.mesh.volume();
        if current <= f32::EPSILON || self.initial_volume <= f32::EPSILON {
            return 0.0;
        }
        (self.initial_volume / current - 1.0).cbrt() / self.graph.len() as f32
    }

    /// Returns every node to its rest lattice position and clears all
    /// dynamic state. Topology and collision pairings are kept.
    pub fn reset_all(&mut self) {
        self.graph.reset_to_rest();
        self.constraints.reset();
        self.forces.clear();
        for volume in &mut self.volumes {
            volume.end_tick();
        }
        self.time_accumulated = 0.0;
        self.last_stats = TickStats::default();
        self.mesh.update(self.graph.nodes(), self.graph.origin());
        debug!("soft body reset to rest state");
    }

    /// Adopts the current committed shape as the new rest configuration.
    pub fn update_rest_state(&mut self) {
        self.constraints.update_initial(self.graph.nodes());
        self.initial_volume = self.mesh.volume();
    }
}
