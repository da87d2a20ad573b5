//! Utility helpers: math extensions and tick profiling.

pub mod math;
pub mod profiling;

pub use math::*;
pub use profiling::{PhaseTimer, TickPhase, TickProfiler, TickStats};
