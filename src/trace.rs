//! Calculation trace.
//!
//! When enabled in `SimulationConfig`, every request the evaluator handles is
//! recorded with its nesting depth and how it was resolved.

use serde::{Deserialize, Serialize};

use crate::period::Period;

/// How a request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The formula ran and its result was stored.
    Computed,
    /// Served from the holder.
    Cached,
    /// Short-circuited to the default value.
    Spiral,
    /// Input variable with no value; the default was stored.
    Input,
    /// The request failed.
    Failed,
}

/// One traced request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Requested variable.
    pub variable: String,
    /// Storage period of the request.
    pub period: Period,
    /// Number of obligations active when the request was resolved.
    pub depth: usize,
    /// How the request was resolved.
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Tracer {
    enabled: bool,
    events: Vec<TraceEvent>,
}

impl Tracer {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, variable: &str, period: &Period, depth: usize, outcome: Outcome) {
        if !self.enabled {
            return;
        }
        self.events.push(TraceEvent {
            variable: variable.to_string(),
            period: period.clone(),
            depth,
            outcome,
        });
    }

    pub(crate) fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }
}
