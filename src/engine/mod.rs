//! Minimal benchmark engine: one prepare step, then a fixed-duration load
//! phase driven by concurrent tokio workers.

pub mod cancel;
pub mod recorder;

pub use cancel::Cancellation;
pub use recorder::{Recorder, Worker};

use crate::error::{BenchError, Result};
use crate::types::result::{Failure, FailureKind, RawResult};
use crate::types::scoring::ScoreTag;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Workload unit run by the engine.
pub trait Scenario: Send + Sync + 'static {
    /// Runs once before the load phase. An error skips the load phase.
    fn prepare(
        &self,
        _worker: &Worker,
    ) -> impl Future<Output = std::result::Result<(), Failure>> + Send {
        async { Ok(()) }
    }

    /// The tag the next `load` call for `worker` will exercise, if known.
    fn action(&self, _worker: &Worker) -> Option<ScoreTag> {
        None
    }

    /// One load iteration. Called repeatedly by every worker until the run stops.
    fn load(&self, worker: &Worker) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone)]
pub struct BenchmarkOptions {
    pub load_duration: Duration,
    pub parallelism: usize,
    /// A single `load` call running longer than this is abandoned.
    pub action_timeout: Duration,
    pub prepare_timeout: Duration,
    /// How long stopped workers get to wind down before being aborted.
    pub grace_period: Duration,
}

impl BenchmarkOptions {
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("load duration", self.load_duration),
            ("action timeout", self.action_timeout),
            ("prepare timeout", self.prepare_timeout),
        ]
        .into_iter()
        .find(|(_, value)| value.is_zero());
        if let Some((name, _)) = zero {
            return Err(BenchError::EngineStart(format!("{name} must be non-zero")));
        }
        if self.parallelism == 0 {
            return Err(BenchError::EngineStart(
                "parallelism must be at least 1".to_string(),
            ));
        }
        let fits = self
            .load_duration
            .checked_add(self.grace_period)
            .and_then(|span| Instant::now().checked_add(span))
            .is_some();
        if !fits {
            return Err(BenchError::EngineStart(
                "load duration plus grace period is out of range".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkState {
    Idle,
    Running,
    Completed,
}

pub struct Benchmark {
    options: BenchmarkOptions,
    state: Mutex<BenchmarkState>,
}

impl Benchmark {
    pub fn new(options: BenchmarkOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            state: Mutex::new(BenchmarkState::Idle),
        })
    }

    pub fn state(&self) -> BenchmarkState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, from: BenchmarkState, to: BenchmarkState) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return Err(BenchError::EngineStart(format!(
                "benchmark is {:?}, expected {:?}",
                *state, from
            )));
        }
        *state = to;
        Ok(())
    }

    /// Runs the scenario until the load duration elapses or `cancel` fires,
    /// and returns the run's single result.
    pub async fn start<S: Scenario>(
        &self,
        cancel: &Cancellation,
        scenario: Arc<S>,
    ) -> Result<RawResult> {
        self.transition(BenchmarkState::Idle, BenchmarkState::Running)?;
        info!(
            load_duration = ?self.options.load_duration,
            parallelism = self.options.parallelism,
            "benchmark started"
        );

        let recorder = Recorder::new();
        if self.prepare(cancel, scenario.as_ref(), &recorder).await {
            self.load(cancel, scenario, &recorder).await;
        }

        let result = recorder.finish();
        self.transition(BenchmarkState::Running, BenchmarkState::Completed)?;
        info!(errors = result.errors().len(), "benchmark completed");
        Ok(result)
    }

    async fn prepare<S: Scenario>(
        &self,
        cancel: &Cancellation,
        scenario: &S,
        recorder: &Recorder,
    ) -> bool {
        let worker = Worker::new(recorder.clone(), None);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("cancelled during prepare");
                false
            }
            outcome = tokio::time::timeout(self.options.prepare_timeout, scenario.prepare(&worker)) => {
                match outcome {
                    Ok(Ok(())) => true,
                    Ok(Err(failure)) => {
                        warn!(error = %failure, "prepare failed; skipping load");
                        worker.record_error(failure);
                        false
                    }
                    Err(_) => {
                        worker.record_error(Failure::new(
                            FailureKind::Prepare,
                            format!(
                                "prepare exceeded {}",
                                humantime::format_duration(self.options.prepare_timeout)
                            ),
                        ));
                        false
                    }
                }
            }
        }
    }

    async fn load<S: Scenario>(&self, cancel: &Cancellation, scenario: Arc<S>, recorder: &Recorder) {
        let deadline = Instant::now() + self.options.load_duration;
        let handles: Vec<JoinHandle<()>> = (0..self.options.parallelism)
            .map(|id| {
                tokio::spawn(run_worker(
                    Worker::new(recorder.clone(), Some(id)),
                    Arc::clone(&scenario),
                    cancel.clone(),
                    deadline,
                    self.options.action_timeout,
                ))
            })
            .collect();

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => debug!("load duration elapsed"),
            _ = cancel.cancelled() => info!("benchmark cancelled"),
        }

        let grace_deadline = Instant::now() + self.options.grace_period;
        for (id, mut handle) in handles.into_iter().enumerate() {
            match tokio::time::timeout_at(grace_deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) if err.is_panic() => {
                    recorder.record_error(
                        Failure {
                            worker: Some(id),
                            ..Failure::new(FailureKind::Panic, "worker panicked")
                        }
                        .with_cause(&err),
                    );
                }
                Ok(Err(err)) => debug!(worker = id, error = %err, "worker task cancelled"),
                Err(_) => {
                    handle.abort();
                    warn!(worker = id, "worker did not stop within grace period; aborted");
                    recorder.record_error(Failure {
                        worker: Some(id),
                        ..Failure::new(FailureKind::Abandoned, "worker abandoned at shutdown")
                    });
                }
            }
        }
    }
}

async fn run_worker<S: Scenario>(
    mut worker: Worker,
    scenario: Arc<S>,
    cancel: Cancellation,
    deadline: Instant,
    action_timeout: Duration,
) {
    loop {
        if cancel.is_cancelled() || Instant::now() >= deadline {
            break;
        }
        let action = scenario.action(&worker);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep_until(deadline) => break,
            outcome = tokio::time::timeout(action_timeout, scenario.load(&worker)) => {
                if outcome.is_err() {
                    let mut failure = Failure::new(
                        FailureKind::Timeout,
                        format!(
                            "worker {} action exceeded {}",
                            worker.id().unwrap_or(0),
                            humantime::format_duration(action_timeout)
                        ),
                    );
                    if let Some(tag) = action {
                        failure = failure.with_action(tag);
                    }
                    worker.record_error(failure);
                }
            }
        }
        worker.advance();
    }
}
