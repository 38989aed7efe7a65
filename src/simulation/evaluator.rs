//! The on-demand evaluator.
//!
//! `Simulation::calculate(variable, period)` resolves a request as follows:
//!
//! 1. Unknown variables fail with `ExecutionError::UnknownVariable`.
//! 2. A cached array for the exact period is returned as is.
//! 3. The tracker is scanned. If the exact pair is already being computed the
//!    request is a pure cycle and fails with `ExecutionError::Cycle`. If the
//!    variable is being computed for another period the request is a spiral
//!    and resolves to the variable's default, without running the formula
//!    and without caching.
//! 4. Otherwise the pair is pushed, the formula runs (re-entering the
//!    evaluator through its `Population` accessor), the pair is popped and the
//!    result is stored.
//!
//! Results computed on a chain that was cut short by a spiral depend on a
//! default that only stands in for the real value inside that chain. They are
//! kept while the top-level call runs and purged from the holders when it
//! returns.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::entity::{Entity, Population};
use crate::error::{CalcError, CalcResult, ExecutionError, ValidationError};
use crate::holder::Holder;
use crate::period::{DateUnit, Period};
use crate::registry::VariableRegistry;
use crate::trace::{Outcome, TraceEvent, Tracer};
use crate::tracker::{ComputationTracker, Obligation, Scan};
use crate::value::Array;
use crate::variable::VariableSpec;

use super::{SimulationBuilder, SimulationConfig, SimulationId};

/// Maps a requested period onto the key results are stored under.
fn storage_period(spec: &VariableSpec, period: &Period) -> Result<Period, ExecutionError> {
    match spec.definition_period {
        DateUnit::Eternity => Ok(Period::eternity()),
        unit if period.unit() == unit && period.size() == 1 => Ok(period.clone()),
        unit => Err(ExecutionError::PeriodMismatch {
            variable: spec.name.clone(),
            expected: unit,
            period: period.clone(),
        }),
    }
}

fn with_formula_context(err: CalcError, variable: &str, period: &Period) -> CalcError {
    match err {
        CalcError::Raised { message } => ExecutionError::Formula {
            variable: variable.to_string(),
            period: period.clone(),
            message,
        }
        .into(),
        other => other,
    }
}

#[derive(Debug, Clone)]
struct EntityPopulation {
    entity: Entity,
    count: usize,
}

/// One simulation run: registry reference, caches and evaluation state.
pub struct Simulation {
    /// Simulation identity.
    pub id: SimulationId,
    config: SimulationConfig,
    registry: Arc<dyn VariableRegistry>,
    populations: HashMap<String, EntityPopulation>,
    holders: HashMap<String, Holder>,
    tracker: ComputationTracker,
    // Results to drop once the current top-level call returns.
    invalidated: HashSet<Obligation>,
    tracer: Tracer,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("populations", &self.populations)
            .field("holders", &self.holders.len())
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Creates a simulation with no populations.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `config` is invalid.
    pub fn new(registry: Arc<dyn VariableRegistry>, config: SimulationConfig) -> CalcResult<Self> {
        config.validate()?;
        Ok(Self {
            id: SimulationId::new(),
            config,
            registry,
            populations: HashMap::new(),
            holders: HashMap::new(),
            tracker: ComputationTracker::new(config.max_spiral_loops),
            invalidated: HashSet::new(),
            tracer: Tracer::new(config.trace),
        })
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder(registry: Arc<dyn VariableRegistry>) -> SimulationBuilder {
        SimulationBuilder::new(registry)
    }

    /// Sets the population of `entity`. Replacing an existing population
    /// drops every cached result of that entity's variables.
    pub fn add_population(&mut self, entity: Entity, count: usize) {
        let key = entity.key.clone();
        let previous = self
            .populations
            .insert(key.clone(), EntityPopulation { entity, count });
        if previous.is_some() {
            let registry = Arc::clone(&self.registry);
            self.holders.retain(|name, _| {
                registry
                    .lookup(name)
                    .map_or(false, |spec| spec.entity != key)
            });
            tracing::debug!(entity = %key, count, "population replaced, cached results dropped");
        }
    }

    /// Number of members of `entity`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownEntity` if no population was set.
    pub fn population_size(&self, entity: &str) -> Result<usize, ValidationError> {
        self.populations
            .get(entity)
            .map(|p| p.count)
            .ok_or_else(|| ValidationError::UnknownEntity {
                key: entity.to_string(),
            })
    }

    /// Entities with a population, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.populations.values().map(|p| &p.entity)
    }

    /// Computes `variable` for `period`, or returns the cached result.
    ///
    /// # Errors
    ///
    /// Fails with `ExecutionError::Cycle` on a pure cycle,
    /// `ExecutionError::UnknownVariable` for unregistered names,
    /// `ExecutionError::PeriodMismatch` if `period` does not match the
    /// variable's definition period, or any failure raised by a formula.
    /// The tracker is empty again whenever this returns.
    #[tracing::instrument(level = "debug", skip(self, period), fields(simulation = %self.id, period = %period))]
    pub fn calculate(&mut self, variable: &str, period: &Period) -> CalcResult<Array> {
        if !self.tracker.is_empty() {
            // Only reachable after a formula panicked mid-evaluation.
            tracing::warn!(
                depth = self.tracker.depth(),
                "discarding obligations left by an aborted calculation"
            );
            self.tracker.clear();
        }
        let result = self.evaluate(variable, period);
        debug_assert!(self.tracker.is_empty(), "tracker must be empty after a top-level call");
        self.purge_invalidated();
        result
    }

    /// Recursive step shared by top-level calls and `Population::calculate`.
    pub(crate) fn evaluate(&mut self, variable: &str, period: &Period) -> CalcResult<Array> {
        let spec = self
            .registry
            .lookup(variable)
            .ok_or_else(|| ExecutionError::UnknownVariable {
                name: variable.to_string(),
            })?;
        let period = storage_period(&spec, period)?;
        let size = self.population_size(&spec.entity)?;
        let depth = self.tracker.depth();

        if let Some(cached) = self.holders.get(variable).and_then(|h| h.get(&period)) {
            let cached = cached.clone();
            tracing::trace!(variable, %period, "cache hit");
            self.tracer.record(variable, &period, depth, Outcome::Cached);
            return Ok(cached);
        }

        match self.tracker.scan(variable, &period) {
            Scan::Clear => {}
            Scan::PureCycle => {
                let chain = self.tracker.chain().to_vec();
                tracing::warn!(variable, %period, depth, "circular definition");
                self.tracer.record(variable, &period, depth, Outcome::Failed);
                return Err(ExecutionError::Cycle {
                    variable: variable.to_string(),
                    period,
                    chain,
                }
                .into());
            }
            Scan::Spiral => {
                let tainted = self.tracker.spiral_segment(variable);
                tracing::debug!(variable, %period, tainted = tainted.len(), "spiral resolved to default");
                self.invalidated.extend(tainted);
                self.tracer.record(variable, &period, depth, Outcome::Spiral);
                return Ok(Array::filled(spec.default_value, size));
            }
        }

        let Some(formula) = spec.formula().cloned() else {
            let array = Array::filled(spec.default_value, size);
            self.holder_mut(&spec, size).set(period.clone(), array.clone())?;
            self.tracer.record(variable, &period, depth, Outcome::Input);
            return Ok(array);
        };

        tracing::debug!(variable, %period, depth, "computing");
        self.tracker.push(variable, period.clone());
        let output = {
            let mut population = Population::new(self, &spec.entity, size);
            (*formula)(&mut population, &period)
        };
        self.tracker.pop();

        let stored = output
            .map_err(|err| with_formula_context(err, variable, &period))
            .and_then(|out| Ok(out.into_array(variable, spec.value_type, size)?))
            .and_then(|array| {
                spec.check(&array)?;
                self.holder_mut(&spec, size).set(period.clone(), array.clone())?;
                Ok(array)
            });

        match stored {
            Ok(array) => {
                tracing::debug!(variable, %period, "stored");
                self.tracer.record(variable, &period, depth, Outcome::Computed);
                Ok(array)
            }
            Err(err) => {
                self.tracer.record(variable, &period, depth, Outcome::Failed);
                Err(err)
            }
        }
    }

    /// Cached array for `variable` at `period`. Never computes.
    #[must_use]
    pub fn peek(&self, variable: &str, period: &Period) -> Option<&Array> {
        let holder = self.holders.get(variable)?;
        let spec = self.registry.lookup(variable)?;
        let key = storage_period(&spec, period).ok()?;
        holder.get(&key)
    }

    /// Stores an input value for `variable` at `period`.
    ///
    /// # Errors
    ///
    /// Fails if the variable or its entity is unknown, the period does not
    /// match the definition period, the array has the wrong length, or an
    /// enum array holds an index outside the variable's possible values.
    pub fn set_input(
        &mut self,
        variable: &str,
        period: &Period,
        array: impl Into<Array>,
    ) -> CalcResult<()> {
        let spec = self
            .registry
            .lookup(variable)
            .ok_or_else(|| ExecutionError::UnknownVariable {
                name: variable.to_string(),
            })?;
        let period = storage_period(&spec, period)?;
        let size = self.population_size(&spec.entity)?;
        let array: Array = array.into();
        let array = array.cast(spec.value_type);
        spec.check(&array)?;
        self.holder_mut(&spec, size).set(period, array)?;
        Ok(())
    }

    /// Drops the cached array for `variable` at `period`.
    pub fn invalidate(&mut self, variable: &str, period: &Period) -> Option<Array> {
        let spec = self.registry.lookup(variable)?;
        let key = storage_period(&spec, period).ok()?;
        self.holders.get_mut(variable)?.delete(&key)
    }

    /// Registers a variable in the shared registry.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DuplicateVariable` if the name is taken.
    pub fn register(&self, spec: VariableSpec) -> CalcResult<()> {
        self.registry.register(spec)?;
        Ok(())
    }

    /// Result cache of `variable`, once anything was stored for it.
    #[must_use]
    pub fn holder(&self, variable: &str) -> Option<&Holder> {
        self.holders.get(variable)
    }

    /// Obligations currently being computed.
    #[must_use]
    pub const fn tracker(&self) -> &ComputationTracker {
        &self.tracker
    }

    /// Configuration the simulation was built with.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Shared variable registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<dyn VariableRegistry> {
        &self.registry
    }

    /// Recorded trace events; empty unless tracing is enabled.
    #[must_use]
    pub fn trace(&self) -> &[TraceEvent] {
        self.tracer.events()
    }

    /// Recorded trace events as a pretty-printed JSON array.
    ///
    /// # Errors
    ///
    /// Returns `CalcError::Internal` if serialization fails.
    pub fn trace_json(&self) -> CalcResult<String> {
        serde_json::to_string_pretty(self.tracer.events())
            .map_err(|e| CalcError::internal(format!("trace serialization failed: {e}")))
    }

    /// Forgets recorded trace events.
    pub fn clear_trace(&mut self) {
        self.tracer.clear();
    }

    fn holder_mut(&mut self, spec: &VariableSpec, size: usize) -> &mut Holder {
        self.holders
            .entry(spec.name.clone())
            .or_insert_with(|| Holder::new(spec.name.clone(), spec.value_type, size))
    }

    fn purge_invalidated(&mut self) {
        if self.invalidated.is_empty() {
            return;
        }
        let mut purged = 0usize;
        for obligation in self.invalidated.drain() {
            if let Some(holder) = self.holders.get_mut(&obligation.variable) {
                if holder.delete(&obligation.period).is_some() {
                    purged += 1;
                }
            }
        }
        tracing::debug!(purged, "purged results that depended on a spiral");
    }
}
