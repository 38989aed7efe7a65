//! Error types for lazycalc.
//!
//! All errors are strongly typed using thiserror.
//! This enables pattern matching on specific error conditions
//! (a cycle versus an unknown variable, for instance) and provides
//! clear error messages.

use thiserror::Error;

use crate::period::{DateUnit, Period};
use crate::tracker::Obligation;
use crate::value::ValueType;

fn format_chain(chain: &[Obligation]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Validation errors that occur on malformed input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A period string or shift that does not denote a valid period.
    #[error("Invalid period '{input}': {reason}")]
    InvalidPeriod {
        /// Offending input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A variable was declared with a blank name.
    #[error("Variable name cannot be empty")]
    EmptyVariableName,

    /// A required builder field was never set.
    #[error("Required field '{field}' is missing")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A declared default does not have the variable's value type.
    #[error("Default value of '{variable}' is {actual}, expected {expected}")]
    DefaultTypeMismatch {
        /// Variable name.
        variable: String,
        /// Declared value type.
        expected: ValueType,
        /// Type of the supplied default.
        actual: ValueType,
    },

    /// An array does not have one item per population member.
    #[error("Array for '{variable}' has {actual} items, population has {expected}")]
    ArrayLength {
        /// Variable name.
        variable: String,
        /// Population size.
        expected: usize,
        /// Length of the supplied array.
        actual: usize,
    },

    /// Element-wise operation on arrays of different lengths.
    #[error("Cannot combine arrays of length {left} and {right}")]
    ShapeMismatch {
        /// Length of the left operand.
        left: usize,
        /// Length of the right operand.
        right: usize,
    },

    /// Arithmetic on a value type that does not support it.
    #[error("Operation '{operation}' is not defined on {value_type} arrays")]
    ForbiddenOperation {
        /// Name of the rejected operation.
        operation: String,
        /// Type it was attempted on.
        value_type: ValueType,
    },

    /// An enumeration declaration, member name or index is invalid.
    #[error("Invalid enumeration '{name}': {reason}")]
    InvalidEnum {
        /// Enumeration or variable name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A variable name is already taken in the registry.
    #[error("Variable '{name}' is already registered")]
    DuplicateVariable {
        /// The duplicated name.
        name: String,
    },

    /// No population was set for an entity.
    #[error("Unknown entity '{key}'")]
    UnknownEntity {
        /// Entity key.
        key: String,
    },

    /// A simulation or batch configuration is out of range.
    #[error("Invalid simulation config: {reason}")]
    InvalidConfig {
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors raised while evaluating variables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    /// The exact `(variable, period)` pair is already being computed.
    #[error("Circular definition detected on {variable}@{period} (chain: {})", format_chain(.chain))]
    Cycle {
        /// Variable requested again.
        variable: String,
        /// Period requested again.
        period: Period,
        /// Active obligations at detection time, outermost first.
        chain: Vec<Obligation>,
    },

    /// The variable is not registered.
    #[error("Unknown variable: {name}")]
    UnknownVariable {
        /// Requested name.
        name: String,
    },

    /// The period's unit does not match the variable's definition period.
    #[error("Variable '{variable}' is defined per {expected}, cannot compute it for {period}")]
    PeriodMismatch {
        /// Variable name.
        variable: String,
        /// Unit the variable is defined for.
        expected: DateUnit,
        /// Requested period.
        period: Period,
    },

    /// A formula read a variable of another entity.
    #[error("Variable '{variable}' belongs to '{target}' and cannot be read from '{requester}'")]
    ProjectionUnsupported {
        /// Variable that was read.
        variable: String,
        /// Entity it belongs to.
        target: String,
        /// Entity of the reading formula.
        requester: String,
    },

    /// A formula body raised an error.
    #[error("Formula for {variable}@{period} failed: {message}")]
    Formula {
        /// Variable whose formula failed.
        variable: String,
        /// Period it was computed for.
        period: Period,
        /// Message raised by the formula.
        message: String,
    },

    /// The batch queue rejected a job.
    #[error("Batch queue is full (capacity {capacity})")]
    QueueFull {
        /// Queue capacity.
        capacity: usize,
    },

    /// The batch workers are gone.
    #[error("Batch worker disconnected")]
    Disconnected,
}

/// Top-level error type for lazycalc.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Evaluation failure.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// Raised from inside a formula body. The evaluator attaches the
    /// variable and period and turns it into `ExecutionError::Formula`.
    #[error("Formula raised: {message}")]
    Raised {
        /// Message supplied by the formula.
        message: String,
    },

    /// A failure that is not the caller's fault.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl CalcError {
    /// Creates the error a formula returns to signal its own failure.
    #[must_use]
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a pure cycle.
    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::Cycle { .. }))
    }

    /// Returns true if the requested variable is not registered.
    #[must_use]
    pub const fn is_unknown_variable(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::UnknownVariable { .. }))
    }

    /// Returns true if a formula body failed.
    #[must_use]
    pub const fn is_formula_failure(&self) -> bool {
        matches!(
            self,
            Self::Execution(ExecutionError::Formula { .. }) | Self::Raised { .. }
        )
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// The obligation chain of a cycle error, outermost first.
    #[must_use]
    pub fn cycle_chain(&self) -> Option<&[Obligation]> {
        match self {
            Self::Execution(ExecutionError::Cycle { chain, .. }) => Some(chain),
            _ => None,
        }
    }

    /// Returns true if this error may succeed on retry. Evaluation is
    /// deterministic, so only a full batch queue qualifies.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Execution(ExecutionError::QueueFull { .. }))
    }
}

/// Result type alias for lazycalc operations.
pub type CalcResult<T> = Result<T, CalcError>;
