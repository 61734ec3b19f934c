use crate::types::scoring::ScoreTag;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The initialize request did not succeed.
    Prepare,
    /// Transport-level failure: connect, reset, client-side timeout.
    Request,
    /// The target answered with an unexpected status.
    Status,
    /// The engine gave up on an action that outlived its deadline.
    Timeout,
    /// A worker was still running after the shutdown grace period.
    Abandoned,
    Panic,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Prepare => "prepare",
            FailureKind::Request => "request",
            FailureKind::Status => "status",
            FailureKind::Timeout => "timeout",
            FailureKind::Abandoned => "abandoned",
            FailureKind::Panic => "panic",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed workload action. Each deducts exactly one point.
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub action: Option<ScoreTag>,
    pub message: String,
    pub cause: Option<String>,
    pub worker: Option<usize>,
    pub elapsed_ms: u64,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            action: None,
            message: message.into(),
            cause: None,
            worker: None,
            elapsed_ms: 0,
        }
    }

    pub fn with_action(mut self, tag: ScoreTag) -> Self {
        self.action = Some(tag);
        self
    }

    /// Attaches the full `source()` chain of `err` as diagnostic context.
    pub fn with_cause(mut self, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            chain.push_str(": ");
            chain.push_str(&inner.to_string());
            source = inner.source();
        }
        self.cause = Some(chain);
        self
    }

    /// Operator-facing rendering with every bit of context we have.
    pub fn verbose(&self) -> String {
        let mut out = format!("kind={}", self.kind);
        if let Some(action) = self.action {
            out.push_str(&format!(" action={action}"));
        }
        if let Some(worker) = self.worker {
            out.push_str(&format!(" worker={worker}"));
        }
        out.push_str(&format!(" elapsed={}ms {}", self.elapsed_ms, self.message));
        if let Some(cause) = &self.cause {
            out.push_str(&format!(" (cause: {cause})"));
        }
        out
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Some(action) => write!(f, "{action}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Everything one completed run produced. Built once by the engine.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RawResult {
    breakdown: BTreeMap<ScoreTag, u64>,
    errors: Vec<Failure>,
}

impl RawResult {
    pub fn new(breakdown: BTreeMap<ScoreTag, u64>, errors: Vec<Failure>) -> Self {
        Self { breakdown, errors }
    }

    pub fn breakdown(&self) -> &BTreeMap<ScoreTag, u64> {
        &self.breakdown
    }

    pub fn errors(&self) -> &[Failure] {
        &self.errors
    }
}
