//! Soft Lattice – position-based deformable bodies for Rust.
//!
//! A body is a cuboid lattice of point masses held together by stretch,
//! compression and bending constraints, relaxed every fixed tick. Impacts
//! spread through the lattice by a bounded directional propagation, and the
//! boundary nodes are triangulated once into a closed surface mesh whose
//! vertices follow the body.

pub mod collision;
pub mod config;
pub mod constraints;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod mesh;
pub mod simulation;
pub mod utils;

pub use glam::{Quat, Vec3};

pub use collision::queries::{NodeRayHit, Raycast, RaycastQuery};
pub use config::{BendingPolicy, CompressionPolicy, SimulationConfig, StretchPolicy};
pub use constraints::{Constraint, ConstraintSet, SolveContext};
pub use core::{
    lattice::NodeGraph,
    node::Node,
    types::Aabb,
    volume::{CollisionShape, CollisionVolume, CollisionVolumeBuilder},
};
pub use dynamics::propagation::{ForceInbox, ForceQueue, PropagationStats};
pub use error::{Result, SimulationError};
pub use mesh::{Edge, SurfaceMesh, Triangle};
pub use simulation::Simulation;
pub use utils::{TickPhase, TickProfiler, TickStats};
