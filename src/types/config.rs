use crate::error::{BenchError, Result};
use crate::types::scoring::{ScoreTag, WeightTable};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_TARGET_HOST: &str = "localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_INITIALIZE_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_EXIT_ERROR_ON_FAIL: bool = true;
pub const DEFAULT_LOAD_DURATION: Duration = Duration::from_secs(60);
pub const DEFAULT_PARALLELISM: usize = 8;
/// Upper bound for every duration setting.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// On-disk shape of `benchdriver.toml`. Every key is optional; missing keys
/// fall back to lower layers and finally to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    pub target_host: Option<String>,
    pub request_timeout: Option<String>,
    pub initialize_request_timeout: Option<String>,
    pub exit_error_on_fail: Option<bool>,
    pub load_duration: Option<String>,
    pub parallelism: Option<usize>,
    pub weights: Option<BTreeMap<String, u32>>,
}

/// Values given on the command line. They win over every file layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target_host: Option<String>,
    pub request_timeout: Option<String>,
    pub initialize_request_timeout: Option<String>,
    pub exit_error_on_fail: Option<bool>,
    pub load_duration: Option<String>,
    pub parallelism: Option<usize>,
}

/// Startup parameters shared read-only by the scenario and the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Options {
    pub target_host: String,
    #[serde(serialize_with = "serialize_duration")]
    pub request_timeout: Duration,
    #[serde(serialize_with = "serialize_duration")]
    pub initialize_request_timeout: Duration,
    pub exit_error_on_fail: bool,
}

impl Options {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.target_host)
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            target_host: DEFAULT_TARGET_HOST.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            initialize_request_timeout: DEFAULT_INITIALIZE_REQUEST_TIMEOUT,
            exit_error_on_fail: DEFAULT_EXIT_ERROR_ON_FAIL,
        }
    }
}

impl fmt::Display for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "target_host={} request_timeout={} initialize_request_timeout={} exit_error_on_fail={}",
            self.target_host,
            humantime::format_duration(self.request_timeout),
            humantime::format_duration(self.initialize_request_timeout),
            self.exit_error_on_fail
        )
    }
}

/// Fully resolved run configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub options: Options,
    pub load_duration: Duration,
    pub parallelism: usize,
    pub weights: WeightTable,
}

impl Settings {
    pub fn resolve(file: BenchConfig, overrides: Overrides) -> Result<Self> {
        let target_host = overrides
            .target_host
            .or(file.target_host)
            .unwrap_or_else(|| DEFAULT_TARGET_HOST.to_string());
        let target_host = validate_host(&target_host)?;

        let request_timeout = resolve_duration(
            "request-timeout",
            overrides.request_timeout.or(file.request_timeout),
            DEFAULT_REQUEST_TIMEOUT,
        )?;
        let initialize_request_timeout = resolve_duration(
            "initialize-request-timeout",
            overrides
                .initialize_request_timeout
                .or(file.initialize_request_timeout),
            DEFAULT_INITIALIZE_REQUEST_TIMEOUT,
        )?;
        let load_duration = resolve_duration(
            "load-duration",
            overrides.load_duration.or(file.load_duration),
            DEFAULT_LOAD_DURATION,
        )?;

        let parallelism = overrides
            .parallelism
            .or(file.parallelism)
            .unwrap_or(DEFAULT_PARALLELISM);
        if parallelism == 0 {
            return Err(BenchError::ConfigParse(
                "parallelism must be at least 1".to_string(),
            ));
        }

        let mut weights = WeightTable::default();
        for (name, weight) in file.weights.unwrap_or_default() {
            let tag: ScoreTag = name
                .parse()
                .map_err(|e: String| BenchError::ConfigParse(format!("weights.{name}: {e}")))?;
            if weight == 0 {
                return Err(BenchError::ConfigParse(format!(
                    "weights.{tag} must be a positive integer"
                )));
            }
            weights.set(tag, weight);
        }

        Ok(Self {
            options: Options {
                target_host,
                request_timeout,
                initialize_request_timeout,
                exit_error_on_fail: overrides
                    .exit_error_on_fail
                    .or(file.exit_error_on_fail)
                    .unwrap_or(DEFAULT_EXIT_ERROR_ON_FAIL),
            },
            load_duration,
            parallelism,
            weights,
        })
    }
}

fn resolve_duration(
    field: &'static str,
    raw: Option<String>,
    default: Duration,
) -> Result<Duration> {
    match raw {
        Some(raw) => parse_duration(field, &raw),
        None => Ok(default),
    }
}

pub fn parse_duration(field: &'static str, raw: &str) -> Result<Duration> {
    let duration =
        humantime::parse_duration(raw.trim()).map_err(|e| BenchError::InvalidDuration {
            field,
            reason: format!("{raw:?}: {e}"),
        })?;
    if duration.is_zero() {
        return Err(BenchError::InvalidDuration {
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    if duration > MAX_DURATION {
        return Err(BenchError::InvalidDuration {
            field,
            reason: format!(
                "{raw:?} exceeds the {} limit",
                humantime::format_duration(MAX_DURATION)
            ),
        });
    }
    Ok(duration)
}

/// Accepts `host` or `host:port`. Schemes and paths are rejected so the
/// scenario can build every URL from the host alone.
pub fn validate_host(raw: &str) -> Result<String> {
    let host = raw.trim();
    if host.is_empty() {
        return Err(BenchError::InvalidHost("host is empty".to_string()));
    }
    if host.contains("://") || host.contains('/') {
        return Err(BenchError::InvalidHost(format!(
            "{host}: expected host[:port] without scheme or path"
        )));
    }
    let url = reqwest::Url::parse(&format!("http://{host}/"))
        .map_err(|e| BenchError::InvalidHost(format!("{host}: {e}")))?;
    if url.host_str().is_none()
        || url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
        || !url.username().is_empty()
        || url.password().is_some()
    {
        return Err(BenchError::InvalidHost(format!(
            "{host}: expected host[:port]"
        )));
    }
    Ok(host.to_string())
}

fn serialize_duration<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_uses_defaults_when_nothing_is_set() {
        let settings = Settings::resolve(BenchConfig::default(), Overrides::default())
            .expect("defaults should resolve");
        assert_eq!(settings.options, Options::default());
        assert_eq!(settings.load_duration, DEFAULT_LOAD_DURATION);
        assert_eq!(settings.parallelism, DEFAULT_PARALLELISM);
        assert_eq!(settings.weights, WeightTable::default());
    }

    #[test]
    fn overrides_win_over_file_values() {
        let file: BenchConfig = toml::from_str(
            r#"
target_host = "file-host:9000"
request_timeout = "5s"
exit_error_on_fail = false
"#,
        )
        .expect("config should parse");
        let overrides = Overrides {
            target_host: Some("cli-host:8081".to_string()),
            ..Overrides::default()
        };

        let settings = Settings::resolve(file, overrides).expect("should resolve");
        assert_eq!(settings.options.target_host, "cli-host:8081");
        assert_eq!(settings.options.request_timeout, Duration::from_secs(5));
        assert!(!settings.options.exit_error_on_fail);
    }

    #[test]
    fn file_weights_override_only_named_tags() {
        let file: BenchConfig = toml::from_str(
            r#"
[weights]
POSTRoot = 10
"#,
        )
        .expect("config should parse");

        let settings = Settings::resolve(file, Overrides::default()).expect("should resolve");
        assert_eq!(settings.weights.weight(ScoreTag::PostRoot), 10);
        assert_eq!(settings.weights.weight(ScoreTag::PostLogin), 2);
    }

    #[test]
    fn unknown_weight_tag_is_rejected() {
        let file: BenchConfig = toml::from_str("[weights]\nPUTRoot = 3\n").expect("should parse");
        let result = Settings::resolve(file, Overrides::default());
        assert!(matches!(result, Err(BenchError::ConfigParse(msg)) if msg.contains("PUTRoot")));
    }

    #[test]
    fn zero_weight_is_rejected() {
        let file: BenchConfig = toml::from_str("[weights]\nGETRoot = 0\n").expect("should parse");
        let result = Settings::resolve(file, Overrides::default());
        assert!(matches!(result, Err(BenchError::ConfigParse(_))));
    }

    #[test]
    fn invalid_and_zero_durations_are_rejected() {
        assert!(matches!(
            parse_duration("request-timeout", "soon"),
            Err(BenchError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_duration("request-timeout", "0s"),
            Err(BenchError::InvalidDuration { .. })
        ));
        assert_eq!(
            parse_duration("request-timeout", "1m").expect("should parse"),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn oversized_durations_are_rejected() {
        assert!(matches!(
            parse_duration("request-timeout", "18446744073709551615s"),
            Err(BenchError::InvalidDuration { field: "request-timeout", .. })
        ));
        assert!(matches!(
            parse_duration("load-duration", "25h"),
            Err(BenchError::InvalidDuration { .. })
        ));
        assert_eq!(
            parse_duration("load-duration", "24h").expect("limit itself is allowed"),
            MAX_DURATION
        );
    }

    #[test]
    fn host_with_credentials_or_fragment_is_rejected() {
        assert!(matches!(
            validate_host("user@localhost:80"),
            Err(BenchError::InvalidHost(_))
        ));
        assert!(matches!(
            validate_host("user:secret@localhost:80"),
            Err(BenchError::InvalidHost(_))
        ));
        assert!(matches!(
            validate_host("localhost:80#frag"),
            Err(BenchError::InvalidHost(_))
        ));
    }

    #[test]
    fn host_validation_accepts_host_port_only() {
        assert_eq!(
            validate_host("localhost:8080").expect("should accept"),
            "localhost:8080"
        );
        assert!(validate_host("127.0.0.1").is_ok());
        assert!(matches!(validate_host(""), Err(BenchError::InvalidHost(_))));
        assert!(matches!(
            validate_host("http://localhost:8080"),
            Err(BenchError::InvalidHost(_))
        ));
        assert!(matches!(
            validate_host("localhost:8080/path"),
            Err(BenchError::InvalidHost(_))
        ));
        assert!(matches!(
            validate_host("localhost:notaport"),
            Err(BenchError::InvalidHost(_))
        ));
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let overrides = Overrides {
            parallelism: Some(0),
            ..Overrides::default()
        };
        let result = Settings::resolve(BenchConfig::default(), overrides);
        assert!(matches!(result, Err(BenchError::ConfigParse(_))));
    }

    #[test]
    fn options_display_uses_human_durations() {
        let rendered = Options::default().to_string();
        assert!(rendered.contains("target_host=localhost:8080"));
        assert!(rendered.contains("request_timeout=3s"));
        assert!(rendered.contains("initialize_request_timeout=10s"));
    }
}
