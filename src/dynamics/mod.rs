//! Tick dynamics: force propagation, prediction and commit, relaxation.

pub mod integrator;
pub mod propagation;
pub mod solver;

pub use integrator::Integrator;
pub use propagation::{ForceInbox, ForceQueue, PropagationStats};
pub use solver::ConstraintSolver;
