//! Spatial queries against the lattice.

pub mod queries;

pub use queries::{NodeRayHit, Raycast, RaycastQuery};
