//! Reqwest-backed seed source.
//!
//! Owns transport details only: request headers, timeout, HTTP status mapping
//! and handing the body to `decode_candidates`.

use super::{decode_candidates, SeedCandidate, SeedError, SeedResult, SeedSource};
use log::{error, info};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::time::{Duration, Instant};

/// Public user listing used to seed an empty dashboard.
pub const DEFAULT_SEED_URL: &str = "https://api.github.com/users";
pub const DEFAULT_SEED_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_USER_AGENT: &str = concat!("userdash/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Seed source performing one blocking GET against a JSON endpoint.
pub struct HttpSeedSource {
    client: Client,
    url: String,
}

impl HttpSeedSource {
    /// Builds a source with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(url: impl Into<String>, timeout: Duration) -> SeedResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SeedError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl SeedSource for HttpSeedSource {
    fn fetch_candidates(&self, limit: usize) -> SeedResult<Vec<SeedCandidate>> {
        let started_at = Instant::now();
        let result = self.fetch(limit);
        match &result {
            Ok(candidates) => info!(
                "event=seed_fetch module=seed status=ok url={} count={} duration_ms={}",
                self.url,
                candidates.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=seed_fetch module=seed status=error url={} duration_ms={} error={}",
                self.url,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

impl HttpSeedSource {
    fn fetch(&self, limit: usize) -> SeedResult<Vec<SeedCandidate>> {
        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| SeedError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .map_err(|err| SeedError::Transport(err.to_string()))?;
        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(SeedError::Status {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        decode_candidates(&body, limit)
    }
}
