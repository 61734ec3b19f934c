pub mod json;

use crate::error::BenchError;
use crate::types::config::Settings;
use crate::types::result::RawResult;
use crate::types::scoring::ScoreSummary;
use std::fmt::Display;
use std::io::{self, Write};

const ADMIN_PREFIX: &str = "[ADMIN] ";

/// Writes run output to two explicit sinks: a concise contestant stream and a
/// verbose operator stream.
pub struct Reporter<C: Write, A: Write> {
    contestant: C,
    admin: A,
}

impl<C: Write, A: Write> Reporter<C, A> {
    pub fn new(contestant: C, admin: A) -> Self {
        Self { contestant, admin }
    }

    fn timestamp() -> String {
        chrono::Local::now().format("%H:%M:%S%.6f").to_string()
    }

    pub fn contestant(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.contestant, "{} {}", Self::timestamp(), message)
    }

    pub fn admin(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.admin, "{}{} {}", ADMIN_PREFIX, Self::timestamp(), message)
    }

    pub fn settings(&mut self, settings: &Settings) -> io::Result<()> {
        self.admin(&settings.options)?;
        let weights = settings
            .weights
            .iter()
            .map(|(tag, weight)| format!("{tag}={weight}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.admin(format!(
            "load_duration={} parallelism={} weights=[{}]",
            humantime::format_duration(settings.load_duration),
            settings.parallelism,
            weights
        ))
    }

    /// Errors first, then the per-tag breakdown, the error count and the score.
    pub fn report(&mut self, result: &RawResult, summary: &ScoreSummary) -> io::Result<()> {
        for failure in result.errors() {
            self.contestant(failure)?;
            self.admin(failure.verbose())?;
        }
        for (tag, count) in result.breakdown() {
            self.contestant(format!("{tag}: {count}"))?;
        }
        self.contestant(format!("error: {}", result.errors().len()))?;
        self.admin(format!(
            "addition={} deduction={}",
            summary.addition, summary.deduction
        ))?;
        self.contestant(format!("score: {}", summary.score))?;
        self.flush()
    }

    /// A run that never happened: full detail for operators, one line for contestants.
    pub fn fatal(&mut self, err: &BenchError) -> io::Result<()> {
        self.admin(format!("fatal: {err} ({err:?})"))?;
        let message = if err.is_config() {
            format!("configuration error: {err}")
        } else {
            "benchmark could not be started; contact the organizers".to_string()
        };
        self.contestant(message)?;
        self.flush()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.contestant.flush()?;
        self.admin.flush()
    }
}
