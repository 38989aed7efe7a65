//! # lazycalc - On-demand evaluation of period-indexed variables
//!
//! lazycalc evaluates named variables for a population of entities over
//! calendar periods. Each variable either carries a formula or is an input
//! with a default value. Values are computed only when requested, memoized per
//! `(variable, period)`, and formulas may request other variables (or the same
//! variable at another period) recursively.
//!
//! ## Core Concepts
//!
//! - **Variable**: a named quantity with a value type, a default, a definition
//!   period and an optional formula
//! - **Period**: a calendar span (ISO week or weekday, day, month, year or
//!   eternity) results are keyed by
//! - **Enumeration**: the possible values of an enum variable, whose arrays
//!   store member indices
//! - **Simulation**: the owner of cached results; resolves requests on demand
//! - **Cycle**: a request for a `(variable, period)` already being computed,
//!   which fails
//! - **Spiral**: a request for a variable already being computed for another
//!   period, which short-circuits to the variable's default
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use lazycalc::{DateUnit, InMemoryVariableRegistry, Period, Simulation, ValueType, VariableSpec};
//!
//! let salary = VariableSpec::builder("salary")
//!     .value_type(ValueType::Float)
//!     .entity("person")
//!     .definition_period(DateUnit::Month)
//!     .default_value(1000.0)
//!     .build()?;
//! let tax = VariableSpec::builder("tax")
//!     .value_type(ValueType::Float)
//!     .entity("person")
//!     .definition_period(DateUnit::Month)
//!     .formula(|pop, period| Ok(pop.calculate("salary", period)?.mul_scalar(0.2.into())?))
//!     .build()?;
//!
//! let registry = Arc::new(InMemoryVariableRegistry::with_variables(vec![salary, tax])?);
//! let mut simulation = Simulation::builder(registry).population("person", 2).build()?;
//!
//! let period: Period = "2013-01".parse()?;
//! let tax = simulation.calculate("tax", &period)?;
//! assert_eq!(tax.to_f64(), vec![200.0, 200.0]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod entity;
pub mod enumeration;
pub mod error;
pub mod period;
pub mod value;
pub mod variable;

// Evaluation
pub mod holder;
pub mod registry;
pub mod simulation;
pub mod trace;
pub mod tracker;

// Parallel runs
pub mod batch;

// Re-export primary types at crate root for convenience
pub use entity::{Entity, Population};
pub use enumeration::Enumeration;
pub use error::{CalcError, CalcResult, ExecutionError, ValidationError};
pub use period::{DateUnit, Instant, Period};
pub use value::{Array, FormulaOutput, Value, ValueType};
pub use variable::{Formula, VariableBuilder, VariableSpec};

pub use holder::Holder;
pub use registry::{InMemoryVariableRegistry, VariableRegistry};
pub use simulation::{Simulation, SimulationBuilder, SimulationConfig, SimulationId};
pub use trace::{Outcome, TraceEvent};
pub use tracker::{ComputationTracker, Obligation, Scan};

pub use batch::{BatchConfig, BatchHandle, BatchJob, BatchOutcome, BatchRunner};
