//! Simulation builder.

use std::sync::Arc;

use crate::entity::Entity;
use crate::error::CalcResult;
use crate::registry::VariableRegistry;

use super::{Simulation, SimulationConfig};

/// Builder for `Simulation`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use lazycalc::{Entity, InMemoryVariableRegistry, Simulation};
///
/// let registry = Arc::new(InMemoryVariableRegistry::new());
/// let simulation = Simulation::builder(registry)
///     .entity(Entity::person("person", "persons"), 3)
///     .build()
///     .unwrap();
/// assert_eq!(simulation.population_size("person").unwrap(), 3);
/// ```
pub struct SimulationBuilder {
    registry: Arc<dyn VariableRegistry>,
    config: SimulationConfig,
    populations: Vec<(Entity, usize)>,
}

impl SimulationBuilder {
    /// Creates a builder evaluating variables from `registry`.
    #[must_use]
    pub fn new(registry: Arc<dyn VariableRegistry>) -> Self {
        Self {
            registry,
            config: SimulationConfig::default(),
            populations: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets `SimulationConfig::max_spiral_loops`.
    #[must_use]
    pub fn max_spiral_loops(mut self, max_spiral_loops: usize) -> Self {
        self.config.max_spiral_loops = max_spiral_loops;
        self
    }

    /// Enables or disables the calculation trace.
    #[must_use]
    pub fn trace(mut self, enabled: bool) -> Self {
        self.config.trace = enabled;
        self
    }

    /// Adds an entity with `count` members.
    #[must_use]
    pub fn entity(mut self, entity: Entity, count: usize) -> Self {
        self.populations.push((entity, count));
        self
    }

    /// Shorthand for a person entity keyed `key`.
    #[must_use]
    pub fn population(self, key: &str, count: usize) -> Self {
        let entity = Entity::person(key, format!("{key}s"));
        self.entity(entity, count)
    }

    /// Builds the simulation.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the configuration is invalid.
    pub fn build(self) -> CalcResult<Simulation> {
        let mut simulation = Simulation::new(self.registry, self.config)?;
        for (entity, count) in self.populations {
            simulation.add_population(entity, count);
        }
        Ok(simulation)
    }
}
