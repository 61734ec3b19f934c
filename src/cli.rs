use crate::types::config::Overrides;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "benchdriver",
    version,
    about = "Contest benchmark driver: runs load against a target and prints its score"
)]
pub struct Cli {
    /// Benchmark target host with port
    #[arg(long, value_name = "HOST:PORT")]
    pub target_host: Option<String>,

    /// Per-request timeout (e.g. 3s, 500ms)
    #[arg(long, value_name = "DURATION")]
    pub request_timeout: Option<String>,

    /// Timeout for the initialize request
    #[arg(long, value_name = "DURATION")]
    pub initialize_request_timeout: Option<String>,

    /// Exit with an error status if the score is zero
    #[arg(long, value_name = "BOOL", action = ArgAction::Set)]
    pub exit_error_on_fail: Option<bool>,

    /// Wall-clock length of the load phase
    #[arg(long, value_name = "DURATION")]
    pub load_duration: Option<String>,

    /// Number of concurrent workers
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Config file (defaults to ./benchdriver.toml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Also write the result as JSON to this path
    #[arg(long, value_name = "PATH")]
    pub result_json: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all diagnostics except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            target_host: self.target_host.clone(),
            request_timeout: self.request_timeout.clone(),
            initialize_request_timeout: self.initialize_request_timeout.clone(),
            exit_error_on_fail: self.exit_error_on_fail,
            load_duration: self.load_duration.clone(),
            parallelism: self.parallelism,
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, _) => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "benchdriver",
            "--target-host",
            "example:80",
            "--request-timeout",
            "1s",
            "--exit-error-on-fail",
            "false",
            "--parallelism",
            "2",
        ])
        .expect("flags should parse");

        let overrides = cli.overrides();
        assert_eq!(overrides.target_host.as_deref(), Some("example:80"));
        assert_eq!(overrides.request_timeout.as_deref(), Some("1s"));
        assert_eq!(overrides.exit_error_on_fail, Some(false));
        assert_eq!(overrides.parallelism, Some(2));
        assert!(overrides.load_duration.is_none());
    }

    #[test]
    fn exit_flag_accepts_equals_form() {
        let cli = Cli::try_parse_from(["benchdriver", "--exit-error-on-fail=true"])
            .expect("flag should parse");
        assert_eq!(cli.exit_error_on_fail, Some(true));
    }

    #[test]
    fn verbosity_maps_to_filter() {
        let quiet = Cli::try_parse_from(["benchdriver", "-q"]).expect("should parse");
        assert_eq!(quiet.log_filter(), "error");
        let debug = Cli::try_parse_from(["benchdriver", "-vv"]).expect("should parse");
        assert_eq!(debug.log_filter(), "debug");
        assert!(Cli::try_parse_from(["benchdriver", "-q", "-v"]).is_err());
    }
}
