use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("invalid target host: {0}")]
    InvalidHost(String),

    #[error("invalid duration for {field}: {reason}")]
    InvalidDuration { field: &'static str, reason: String },

    #[error("invalid result path: {0}")]
    ResultPath(String),

    #[error("benchmark failed to start: {0}")]
    EngineStart(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BenchError {
    /// Configuration errors happen before any workload has been started.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            BenchError::ConfigNotFound(_)
                | BenchError::ConfigParse(_)
                | BenchError::InvalidHost(_)
                | BenchError::InvalidDuration { .. }
                | BenchError::ResultPath(_)
                | BenchError::Toml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
