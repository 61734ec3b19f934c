mod cli;
mod config;
mod engine;
mod error;
mod report;
mod scenario;
mod score;
mod types;

use crate::engine::{Benchmark, BenchmarkOptions, Cancellation};
use crate::error::BenchError;
use crate::report::json::{self, ResultDocument};
use crate::report::Reporter;
use crate::scenario::HttpScenario;
use crate::types::config::Settings;
use clap::Parser;
use std::io::{Stderr, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod exit_code {
    use crate::types::scoring::FinalScore;

    pub const PASS: i32 = 0;
    pub const FAIL: i32 = 1;
    pub const FATAL: i32 = 2;

    /// The judge reads pass/fail from this status alone.
    pub fn for_score(score: FinalScore, exit_error_on_fail: bool) -> i32 {
        if exit_error_on_fail && score == 0 {
            FAIL
        } else {
            PASS
        }
    }
}

/// Slack on top of the client timeouts before the engine abandons an action.
const ABANDON_MARGIN: Duration = Duration::from_secs(1);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn init_tracing(cli: &cli::Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn run(cli: &cli::Cli, reporter: &mut Reporter<Stdout, Stderr>) -> Result<i32, BenchError> {
    let file = config::load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(file, cli.overrides())?;
    if let Some(path) = &cli.result_json {
        json::check_output_path(path)?;
    }
    reporter.settings(&settings)?;

    let options = Arc::new(settings.options.clone());
    let scenario = Arc::new(HttpScenario::new(Arc::clone(&options))?);
    let benchmark = Benchmark::new(BenchmarkOptions {
        load_duration: settings.load_duration,
        parallelism: settings.parallelism,
        action_timeout: options.request_timeout.saturating_add(ABANDON_MARGIN),
        prepare_timeout: options
            .initialize_request_timeout
            .saturating_add(ABANDON_MARGIN),
        grace_period: SHUTDOWN_GRACE,
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| BenchError::EngineStart(format!("tokio runtime: {e}")))?;
    let result = runtime.block_on(async {
        let cancel = Cancellation::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            warn!("shutdown signal received; stopping benchmark");
            on_signal.cancel();
        });
        benchmark.start(&cancel, scenario).await
    })?;
    debug!(state = ?benchmark.state(), "engine finished");

    let summary = score::compute_score(&result, &settings.weights);
    reporter.report(&result, &summary)?;

    if let Some(path) = &cli.result_json {
        let document = ResultDocument {
            options: &options,
            result: &result,
            summary: &summary,
        };
        // Export failures leave the scored exit code unchanged.
        if let Err(e) = json::write_json(path, &document) {
            error!(path = %path.display(), error = %e, "failed to write result json");
            reporter.admin(format!("result json not written to {}: {e}", path.display()))?;
        }
    }

    Ok(exit_code::for_score(summary.score, options.exit_error_on_fail))
}

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(&cli);

    let mut reporter = Reporter::new(std::io::stdout(), std::io::stderr());
    match run(&cli, &mut reporter) {
        Ok(code) => {
            if code != exit_code::PASS {
                std::process::exit(code);
            }
        }
        Err(e) => {
            error!(error = %e, "benchmark aborted");
            if let Err(io) = reporter.fatal(&e) {
                eprintln!("error: {e} (reporting failed: {io})");
            }
            std::process::exit(exit_code::FATAL);
        }
    }
}
