//! Error types for soft body construction and stepping.

use thiserror::Error;

/// Errors that can occur while building or driving a soft body.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Node mass must be positive and finite.
    #[error("node mass must be positive and finite, got {0}")]
    InvalidMass(f32),

    /// A configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A node index does not exist in the graph.
    #[error("node index {index} out of bounds (count: {count})")]
    NodeOutOfBounds { index: usize, count: usize },

    /// Topology growth could not find a valid seed triangle.
    #[error("cannot seed surface mesh: {0}")]
    MeshSeed(String),

    /// The node graph has no nodes.
    #[error("node graph is empty")]
    EmptyLattice,
}

impl SimulationError {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a mesh seeding error.
    pub fn mesh_seed(msg: impl Into<String>) -> Self {
        Self::MeshSeed(msg.into())
    }
}

/// Result type for soft body operations.
pub type Result<T> = std::result::Result<T, SimulationError>;
