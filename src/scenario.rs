use crate::engine::{Scenario, Worker};
use crate::error::Result;
use crate::types::config::Options;
use crate::types::result::{Failure, FailureKind};
use crate::types::scoring::ScoreTag;
use reqwest::{Client, Method};
use std::sync::Arc;

pub const INITIALIZE_PATH: &str = "/initialize";

/// Drives the target over HTTP, one request per load iteration.
pub struct HttpScenario {
    options: Arc<Options>,
    base_url: String,
    client: Client,
    initialize_client: Client,
}

impl HttpScenario {
    pub fn new(options: Arc<Options>) -> Result<Self> {
        let user_agent = concat!("benchdriver/", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .timeout(options.request_timeout)
            .user_agent(user_agent)
            .no_proxy()
            .build()?;
        let initialize_client = Client::builder()
            .timeout(options.initialize_request_timeout)
            .user_agent(user_agent)
            .no_proxy()
            .build()?;
        Ok(Self {
            base_url: options.base_url(),
            options,
            client,
            initialize_client,
        })
    }

    /// Workers start at different offsets so every tag is hit from the first tick.
    pub fn action_for(worker: &Worker) -> ScoreTag {
        let offset = worker.id().unwrap_or(0) as u64;
        let index =
            (worker.iteration().wrapping_add(offset) % ScoreTag::ALL.len() as u64) as usize;
        ScoreTag::ALL[index]
    }

    async fn send(
        &self,
        client: &Client,
        method: Method,
        path: &str,
    ) -> std::result::Result<(), Failure> {
        let url = format!("{}{}", self.base_url, path);
        let response = match client.request(method.clone(), &url).send().await {
            Ok(response) => response,
            Err(err) => {
                let (kind, what) = if err.is_timeout() {
                    (FailureKind::Timeout, "timed out")
                } else {
                    (FailureKind::Request, "request failed")
                };
                return Err(
                    Failure::new(kind, format!("{method} {path} {what}")).with_cause(&err)
                );
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Failure::new(
                FailureKind::Status,
                format!("{method} {path} returned unexpected status {status}"),
            ));
        }
        Ok(())
    }
}

pub fn request_for(tag: ScoreTag) -> (Method, &'static str) {
    match tag {
        ScoreTag::GetRoot => (Method::GET, "/"),
        ScoreTag::GetLogin => (Method::GET, "/login"),
        ScoreTag::PostLogin => (Method::POST, "/login"),
        ScoreTag::PostRoot => (Method::POST, "/"),
    }
}

impl Scenario for HttpScenario {
    async fn prepare(&self, _worker: &Worker) -> std::result::Result<(), Failure> {
        tracing::info!(target_host = %self.options.target_host, "sending initialize request");
        self.send(&self.initialize_client, Method::POST, INITIALIZE_PATH)
            .await
            .map_err(|failure| Failure {
                kind: FailureKind::Prepare,
                ..failure
            })
    }

    fn action(&self, worker: &Worker) -> Option<ScoreTag> {
        Some(Self::action_for(worker))
    }

    async fn load(&self, worker: &Worker) {
        let tag = Self::action_for(worker);
        let (method, path) = request_for(tag);
        match self.send(&self.client, method, path).await {
            Ok(()) => worker.record_score(tag),
            Err(failure) => worker.record_error(failure.with_action(tag)),
        }
    }
}
