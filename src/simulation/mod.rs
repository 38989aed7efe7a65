//! Simulations: the owners of cached results and the entry point for
//! on-demand evaluation.
//!
//! A `Simulation` holds a reference to the variable registry, one holder per
//! variable, the computation tracker and the population size of every entity.
//! Evaluation is synchronous and single-threaded per simulation; independent
//! simulations share no mutable state and can be evaluated in parallel (see
//! `crate::batch`).

pub mod builder;
pub mod config;
pub mod evaluator;

pub use builder::SimulationBuilder;
pub use config::SimulationConfig;
pub use evaluator::Simulation;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationId(Uuid);

impl SimulationId {
    /// Create a new random simulation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SimulationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SimulationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
