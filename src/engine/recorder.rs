use crate::types::result::{Failure, RawResult};
use crate::types::scoring::ScoreTag;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

#[derive(Debug, Default)]
struct Accumulator {
    breakdown: BTreeMap<ScoreTag, u64>,
    errors: Vec<Failure>,
    closed: bool,
}

/// Append-only sink shared by every worker of one run.
#[derive(Debug, Clone)]
pub struct Recorder {
    inner: Arc<Mutex<Accumulator>>,
    started: Instant,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Accumulator::default())),
            started: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Accumulator> {
        // Counters stay consistent even if a worker panicked mid-record.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_score(&self, tag: ScoreTag) {
        let mut acc = self.lock();
        if acc.closed {
            tracing::warn!(tag = %tag, "score recorded after completion; dropped");
            return;
        }
        *acc.breakdown.entry(tag).or_insert(0) += 1;
    }

    pub fn record_error(&self, mut failure: Failure) {
        failure.elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut acc = self.lock();
        if acc.closed {
            tracing::warn!(error = %failure, "error recorded after completion; dropped");
            return;
        }
        tracing::debug!(error = %failure.verbose(), "workload error");
        acc.errors.push(failure);
    }

    /// Closes the sink and hands out the run's only result.
    pub fn finish(&self) -> RawResult {
        let mut acc = self.lock();
        acc.closed = true;
        RawResult::new(
            std::mem::take(&mut acc.breakdown),
            std::mem::take(&mut acc.errors),
        )
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle a scenario records through. One per worker task.
#[derive(Debug)]
pub struct Worker {
    id: Option<usize>,
    iteration: u64,
    recorder: Recorder,
}

impl Worker {
    pub fn new(recorder: Recorder, id: Option<usize>) -> Self {
        Self {
            id,
            iteration: 0,
            recorder,
        }
    }

    pub fn id(&self) -> Option<usize> {
        self.id
    }

    /// Number of completed `load` calls on this worker.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub(crate) fn advance(&mut self) {
        self.iteration += 1;
    }

    pub fn record_score(&self, tag: ScoreTag) {
        self.recorder.record_score(tag);
    }

    pub fn record_error(&self, mut failure: Failure) {
        if failure.worker.is_none() {
            failure.worker = self.id;
        }
        self.recorder.record_error(failure);
    }
}
