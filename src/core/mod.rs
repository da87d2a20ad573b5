//! Core data: lattice nodes, the node graph, collision volumes and bounds.

pub mod lattice;
pub mod node;
pub mod types;
pub mod volume;

pub use lattice::NodeGraph;
pub use node::{Node, FULL_NEIGHBORHOOD};
pub use types::Aabb;
pub use volume::{CollisionShape, CollisionVolume, CollisionVolumeBuilder, VolumeContact};
