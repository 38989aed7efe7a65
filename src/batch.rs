//! Parallel evaluation of independent simulations.
//!
//! A simulation is evaluated on one thread at a time, but distinct simulations
//! share no mutable state. `BatchRunner` is a small bounded worker pool that
//! moves each submitted simulation to a worker thread, runs its requests in
//! order and hands the simulation back together with the results.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::{CalcError, CalcResult, ExecutionError};
use crate::period::Period;
use crate::simulation::Simulation;
use crate::value::Array;

/// Worker pool configuration.
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum queued jobs.
    pub queue_capacity: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 64,
        }
    }
}

/// A simulation and the requests to evaluate on it, in order.
#[derive(Debug)]
pub struct BatchJob {
    /// Simulation the requests run on.
    pub simulation: Simulation,
    /// `(variable, period)` requests, evaluated in order.
    pub requests: Vec<(String, Period)>,
}

impl BatchJob {
    /// A job with no requests yet.
    #[must_use]
    pub fn new(simulation: Simulation) -> Self {
        Self {
            simulation,
            requests: Vec::new(),
        }
    }

    /// Queues a `calculate(variable, period)` request.
    #[must_use]
    pub fn request(mut self, variable: impl Into<String>, period: Period) -> Self {
        self.requests.push((variable.into(), period));
        self
    }

    /// Runs every request on the current thread.
    #[must_use]
    pub fn run(self) -> BatchOutcome {
        let Self {
            mut simulation,
            requests,
        } = self;
        let results = requests
            .iter()
            .map(|(variable, period)| simulation.calculate(variable, period))
            .collect();
        BatchOutcome {
            simulation,
            results,
        }
    }
}

/// The simulation handed back after its job, with one result per request.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The simulation, with everything it cached while running.
    pub simulation: Simulation,
    /// One result per request, in request order.
    pub results: Vec<CalcResult<Array>>,
}

struct Job {
    batch: BatchJob,
    reply: Sender<BatchOutcome>,
}

/// Handle returned by `BatchRunner::submit`.
pub struct BatchHandle {
    rx: Receiver<BatchOutcome>,
}

impl BatchHandle {
    /// Waits for the job to complete.
    pub fn join(self) -> CalcResult<BatchOutcome> {
        self.rx
            .recv()
            .map_err(|_| CalcError::Execution(ExecutionError::Disconnected))
    }
}

/// Bounded pool of worker threads evaluating simulations.
pub struct BatchRunner {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl BatchRunner {
    /// Starts the worker threads.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a thread cannot be spawned.
    pub fn new(config: BatchConfig) -> CalcResult<Self> {
        let workers = config.workers.max(1);
        let queue_capacity = config.queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let handle = thread::Builder::new()
                .name(format!("lazycalc-batch-{idx}"))
                .spawn(move || {
                    while let Ok(Job { batch, reply }) = rx.recv() {
                        let id = batch.simulation.id;
                        let outcome = batch.run();
                        tracing::debug!(simulation = %id, requests = outcome.results.len(), "batch job done");
                        let _ = reply.send(outcome);
                    }
                })
                .map_err(|e| CalcError::internal(format!("failed to spawn batch worker: {e}")))?;
            handles.push(handle);
        }

        Ok(Self {
            tx: Some(tx),
            workers: handles,
            queue_capacity,
        })
    }

    /// Queues a job without blocking.
    ///
    /// # Errors
    ///
    /// Fails with `ExecutionError::QueueFull` when the queue is at capacity.
    pub fn submit(&self, batch: BatchJob) -> CalcResult<BatchHandle> {
        let (reply, rx) = bounded::<BatchOutcome>(1);
        let tx = self.sender()?;
        match tx.try_send(Job { batch, reply }) {
            Ok(()) => Ok(BatchHandle { rx }),
            Err(TrySendError::Full(_)) => Err(ExecutionError::QueueFull {
                capacity: self.queue_capacity,
            }
            .into()),
            Err(TrySendError::Disconnected(_)) => Err(ExecutionError::Disconnected.into()),
        }
    }

    /// Runs every job, blocking while the queue is full, and returns the
    /// outcomes in submission order.
    pub fn run_all(&self, batches: impl IntoIterator<Item = BatchJob>) -> CalcResult<Vec<BatchOutcome>> {
        let tx = self.sender()?;
        let mut handles = Vec::new();
        for batch in batches {
            let (reply, rx) = bounded::<BatchOutcome>(1);
            tx.send(Job { batch, reply })
                .map_err(|_| CalcError::Execution(ExecutionError::Disconnected))?;
            handles.push(BatchHandle { rx });
        }
        handles.into_iter().map(BatchHandle::join).collect()
    }

    fn sender(&self) -> CalcResult<&Sender<Job>> {
        self.tx
            .as_ref()
            .ok_or(CalcError::Execution(ExecutionError::Disconnected))
    }
}

impl Drop for BatchRunner {
    fn drop(&mut self) {
        // Closing the channel lets workers drain queued jobs, then exit.
        drop(self.tx.take());
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}
