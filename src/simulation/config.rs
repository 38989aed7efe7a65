//! Simulation configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Tunables for one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of other periods a variable may already be active for before a
    /// further request for it is short-circuited to its default.
    pub max_spiral_loops: usize,
    /// Record a calculation trace.
    pub trace: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_spiral_loops: 1,
            trace: false,
        }
    }
}

impl SimulationConfig {
    /// Validate the configuration.
    ///
    /// This must be called before constructing a `Simulation`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_spiral_loops == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "max_spiral_loops must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
