//! Variable registry.
//!
//! The registry owns the variable declarations a simulation evaluates. It is
//! held by reference (`Arc<dyn VariableRegistry>`), never as process-wide
//! state, so several simulations may share one registry or use their own.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::ValidationError;
use crate::value::Value;
use crate::variable::VariableSpec;

/// Lookup contract for registered variables.
pub trait VariableRegistry: Send + Sync {
    /// Registers `spec`. Fails if the name is already present.
    fn register(&self, spec: VariableSpec) -> Result<(), ValidationError>;

    /// Returns the declaration for `name`, if any.
    fn lookup(&self, name: &str) -> Option<Arc<VariableSpec>>;

    /// Registered names, sorted.
    fn names(&self) -> Vec<String>;

    /// Default fill value of `name`.
    fn default_of(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(|spec| spec.default_value)
    }

    /// Returns true if `name` is registered.
    fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

/// Thread-safe in-memory registry.
#[derive(Debug, Default)]
pub struct InMemoryVariableRegistry {
    variables: RwLock<HashMap<String, Arc<VariableSpec>>>,
}

impl InMemoryVariableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from several specs, failing on the first duplicate.
    pub fn with_variables(
        specs: impl IntoIterator<Item = VariableSpec>,
    ) -> Result<Self, ValidationError> {
        let registry = Self::new();
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// Number of registered variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VariableRegistry for InMemoryVariableRegistry {
    fn register(&self, spec: VariableSpec) -> Result<(), ValidationError> {
        // Specs are immutable once inserted, so a poisoned map is still consistent.
        let mut variables = self
            .variables
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if variables.contains_key(&spec.name) {
            return Err(ValidationError::DuplicateVariable { name: spec.name });
        }
        tracing::debug!(variable = %spec.name, entity = %spec.entity, "registered variable");
        variables.insert(spec.name.clone(), Arc::new(spec));
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Arc<VariableSpec>> {
        self.variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
