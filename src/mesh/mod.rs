//! Boundary mesh: one-off topology growth and per-tick vertex refresh.

pub mod surface;
pub mod topology;

pub use surface::SurfaceMesh;
pub use topology::{Edge, MeshTopology, Triangle};
