//! Per-variable result cache.

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::period::Period;
use crate::value::{Array, ValueType};

/// Cache of computed arrays for one variable, keyed by exact period.
///
/// Holds at most one array per period; every stored array has exactly
/// `population_size` elements. Reads never trigger computation.
#[derive(Debug, Clone)]
pub struct Holder {
    variable: String,
    value_type: ValueType,
    population_size: usize,
    arrays: BTreeMap<Period, Array>,
}

impl Holder {
    /// Creates an empty holder for `variable`.
    #[must_use]
    pub fn new(variable: impl Into<String>, value_type: ValueType, population_size: usize) -> Self {
        Self {
            variable: variable.into(),
            value_type,
            population_size,
            arrays: BTreeMap::new(),
        }
    }

    /// Name of the cached variable.
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Element type stored arrays are cast to.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Length every stored array must have.
    #[must_use]
    pub const fn population_size(&self) -> usize {
        self.population_size
    }

    /// Cached array for exactly `period`. Entries whose length no longer
    /// matches the population are treated as absent.
    #[must_use]
    pub fn get(&self, period: &Period) -> Option<&Array> {
        self.arrays
            .get(period)
            .filter(|array| array.len() == self.population_size)
    }

    /// Stores `array` for `period`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::ArrayLength` if the array does not match the
    /// population size.
    pub fn set(&mut self, period: Period, array: Array) -> Result<(), ValidationError> {
        if array.len() != self.population_size {
            return Err(ValidationError::ArrayLength {
                variable: self.variable.clone(),
                expected: self.population_size,
                actual: array.len(),
            });
        }
        self.arrays.insert(period, array.cast(self.value_type));
        Ok(())
    }

    /// Removes the entry for `period`.
    pub fn delete(&mut self, period: &Period) -> Option<Array> {
        self.arrays.remove(period)
    }

    /// Periods with a cached array, in ascending order.
    pub fn known_periods(&self) -> impl Iterator<Item = &Period> {
        self.arrays.keys()
    }

    /// Number of cached periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Drops every cached array.
    pub fn clear(&mut self) {
        self.arrays.clear();
    }
}
