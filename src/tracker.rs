//! Active computation tracking.
//!
//! The tracker is an explicit stack of the `(variable, period)` pairs whose
//! formulas are currently running. Scanning it before each fresh computation
//! tells the evaluator whether a request is a pure cycle (the exact pair is
//! already running), a spiral (the same variable is running for another
//! period) or safe to compute.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::period::Period;

/// A `(variable, period)` pair whose formula is being evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Obligation {
    /// Variable name.
    pub variable: String,
    /// Storage period being computed.
    pub period: Period,
}

impl Obligation {
    /// Pairs `variable` with `period`.
    #[must_use]
    pub fn new(variable: impl Into<String>, period: Period) -> Self {
        Self {
            variable: variable.into(),
            period,
        }
    }

    fn is(&self, variable: &str, period: &Period) -> bool {
        self.variable == variable && &self.period == period
    }
}

impl fmt::Display for Obligation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.variable, self.period)
    }
}

/// Outcome of scanning the active obligations for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// Nothing related is running.
    Clear,
    /// The exact pair is already running.
    PureCycle,
    /// The variable is already running for other periods.
    Spiral,
}

/// Ordered record of the obligations currently being evaluated.
#[derive(Debug, Clone)]
pub struct ComputationTracker {
    active: Vec<Obligation>,
    max_spiral_loops: usize,
}

impl Default for ComputationTracker {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ComputationTracker {
    /// Creates an empty tracker. A spiral is declared once a variable is
    /// already active for `max_spiral_loops` other periods (at least 1).
    #[must_use]
    pub fn new(max_spiral_loops: usize) -> Self {
        Self {
            active: Vec::new(),
            max_spiral_loops: max_spiral_loops.max(1),
        }
    }

    /// Marks `(variable, period)` as being computed.
    pub fn push(&mut self, variable: impl Into<String>, period: Period) {
        self.active.push(Obligation::new(variable, period));
    }

    /// Removes the most recently pushed obligation.
    pub fn pop(&mut self) -> Option<Obligation> {
        self.active.pop()
    }

    /// Classifies a request for `(variable, period)` against the active list.
    ///
    /// An exact match anywhere wins over a same-variable match at another
    /// period.
    #[must_use]
    pub fn scan(&self, variable: &str, period: &Period) -> Scan {
        let mut other_periods = 0;
        for obligation in self.active.iter().rev() {
            if obligation.variable != variable {
                continue;
            }
            if &obligation.period == period {
                return Scan::PureCycle;
            }
            other_periods += 1;
        }
        if other_periods >= self.max_spiral_loops {
            Scan::Spiral
        } else {
            Scan::Clear
        }
    }

    /// The obligations a spiral on `variable` taints: every active entry from
    /// the most recent down to, and including, the `max_spiral_loops`-th most
    /// recent entry for `variable`.
    #[must_use]
    pub fn spiral_segment(&self, variable: &str) -> Vec<Obligation> {
        let mut seen = 0;
        let mut segment = Vec::new();
        for obligation in self.active.iter().rev() {
            segment.push(obligation.clone());
            if obligation.variable == variable {
                seen += 1;
                if seen >= self.max_spiral_loops {
                    break;
                }
            }
        }
        segment
    }

    /// Returns true if the exact pair is active.
    #[must_use]
    pub fn contains(&self, variable: &str, period: &Period) -> bool {
        self.active.iter().any(|o| o.is(variable, period))
    }

    /// Active obligations, outermost first.
    #[must_use]
    pub fn chain(&self) -> &[Obligation] {
        &self.active
    }

    /// Number of active obligations.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Returns true if nothing is being computed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Spiral threshold the tracker was created with.
    #[must_use]
    pub const fn max_spiral_loops(&self) -> usize {
        self.max_spiral_loops
    }

    /// Drops every obligation.
    pub fn clear(&mut self) {
        self.active.clear();
    }
}
