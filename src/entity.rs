//! Entities and the population accessor handed to formulas.
//!
//! Entities are static descriptive records (persons, households, ...). A
//! simulation knows how many members each entity's population has; every
//! array computed for a variable has exactly that many elements.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CalcResult, ExecutionError};
use crate::period::Period;
use crate::simulation::Simulation;
use crate::value::{Array, Value};

/// Descriptive record of an entity kind.
///
/// # Examples
///
/// ```
/// use lazycalc::Entity;
///
/// let person = Entity::person("person", "persons");
/// assert!(person.is_person);
/// assert_eq!(person.to_string(), "person");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Singular key variables refer to.
    pub key: String,
    /// Plural form, used when presenting populations.
    pub plural: String,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Individuals, as opposed to groups of individuals.
    pub is_person: bool,
}

impl Entity {
    /// An individual entity.
    #[must_use]
    pub fn person(key: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            plural: plural.into(),
            label: None,
            is_person: true,
        }
    }

    /// A group entity (household, family, ...).
    #[must_use]
    pub fn group(key: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            plural: plural.into(),
            label: None,
            is_person: false,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Accessor a formula uses to read other variables.
///
/// Bound to the simulation being evaluated and to the entity of the variable
/// whose formula is running. `calculate` re-enters the evaluator, so every
/// cycle and spiral rule applies to reads made through it.
pub struct Population<'a> {
    simulation: &'a mut Simulation,
    entity: &'a str,
    count: usize,
}

impl<'a> Population<'a> {
    pub(crate) fn new(simulation: &'a mut Simulation, entity: &'a str, count: usize) -> Self {
        Self {
            simulation,
            entity,
            count,
        }
    }

    /// Key of the entity this accessor serves.
    #[must_use]
    pub fn entity(&self) -> &str {
        self.entity
    }

    /// Number of members.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Read-only view of the owning simulation.
    #[must_use]
    pub fn simulation(&self) -> &Simulation {
        self.simulation
    }

    /// Computes (or fetches) `variable` for `period`.
    ///
    /// # Errors
    ///
    /// Fails with `ExecutionError::ProjectionUnsupported` if `variable`
    /// belongs to another entity, and otherwise with whatever evaluating it
    /// fails with.
    pub fn calculate(&mut self, variable: &str, period: &Period) -> CalcResult<Array> {
        if let Some(spec) = self.simulation.registry().lookup(variable) {
            if spec.entity != self.entity {
                return Err(ExecutionError::ProjectionUnsupported {
                    variable: variable.to_string(),
                    target: spec.entity.clone(),
                    requester: self.entity.to_string(),
                }
                .into());
            }
        }
        self.simulation.evaluate(variable, period)
    }

    /// An array of `value` sized to the population.
    #[must_use]
    pub fn filled(&self, value: impl Into<Value>) -> Array {
        Array::filled(value.into(), self.count)
    }

    /// A float array of zeros sized to the population.
    #[must_use]
    pub fn empty_array(&self) -> Array {
        Array::filled(Value::Float(0.0), self.count)
    }
}

impl fmt::Debug for Population<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Population")
            .field("simulation", &self.simulation.id)
            .field("entity", &self.entity)
            .field("count", &self.count)
            .finish()
    }
}
