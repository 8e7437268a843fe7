//! Bootstrap import sources.
//!
//! # Responsibility
//! - Define the remote seed capability used when no durable collection exists.
//! - Synthesize user records from seed candidates.
//!
//! # Invariants
//! - At most `limit` candidates are consumed from a source.
//! - Synthesized ages fall in `[20, 50)`; emails derive from the name.

mod http_source;

pub use http_source::{HttpSeedSource, DEFAULT_SEED_TIMEOUT, DEFAULT_SEED_URL};

use crate::model::user::{UserId, UserRecord};
use rand::Rng;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of candidates consumed by the bootstrap import.
pub const SEED_LIMIT: usize = 10;

const SEED_EMAIL_DOMAIN: &str = "example.com";
const SEED_MIN_AGE: u32 = 20;
const SEED_MAX_AGE_EXCLUSIVE: u32 = 50;

pub type SeedResult<T> = Result<T, SeedError>;

/// Failure fetching or decoding seed candidates.
#[derive(Debug)]
pub enum SeedError {
    /// Network-level failure (connect, timeout, body read).
    Transport(String),
    /// Source answered with a non-success HTTP status.
    Status { status: u16, body: String },
    /// Response body is not a list of usable candidates.
    Decode(String),
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "seed request failed: {message}"),
            Self::Status { status, body } => {
                write!(f, "seed source returned status {status}: {body}")
            }
            Self::Decode(message) => write!(f, "invalid seed payload: {message}"),
        }
    }
}

impl Error for SeedError {}

/// Identifier exposed by a seed source; numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeedId {
    Number(i64),
    Text(String),
}

impl Display for SeedId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// One candidate record offered by a seed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedCandidate {
    pub id: SeedId,
    pub name: String,
}

impl SeedCandidate {
    pub fn new(id: SeedId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Remote capability returning up to `limit` seed candidates.
pub trait SeedSource {
    fn fetch_candidates(&self, limit: usize) -> SeedResult<Vec<SeedCandidate>>;
}

impl<T: SeedSource + ?Sized> SeedSource for &T {
    fn fetch_candidates(&self, limit: usize) -> SeedResult<Vec<SeedCandidate>> {
        (**self).fetch_candidates(limit)
    }
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    id: SeedId,
    login: Option<String>,
    name: Option<String>,
}

/// Decodes a JSON array of candidate objects, consuming the first `limit`.
///
/// Entries past `limit` are not inspected.
pub fn decode_candidates(body: &[u8], limit: usize) -> SeedResult<Vec<SeedCandidate>> {
    let entries: Vec<serde_json::Value> = serde_json::from_slice(body)
        .map_err(|err| SeedError::Decode(format!("expected a JSON array: {err}")))?;

    entries
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, entry)| -> SeedResult<SeedCandidate> {
            let dto: CandidateDto = serde_json::from_value(entry)
                .map_err(|err| SeedError::Decode(format!("entry {index}: {err}")))?;
            let name = dto.login.or(dto.name).ok_or_else(|| {
                SeedError::Decode(format!("entry {index}: missing `login` or `name`"))
            })?;
            Ok(SeedCandidate::new(dto.id, name))
        })
        .collect()
}

/// Builds user records from seed candidates.
///
/// `age` and `is_active` are drawn from `rng`; callers inject a seeded
/// generator when they need reproducible output.
pub fn synthesize_records<R: Rng>(
    candidates: &[SeedCandidate],
    rng: &mut R,
) -> Vec<UserRecord> {
    candidates
        .iter()
        .map(|candidate| UserRecord {
            id: UserId::new(candidate.id.to_string()),
            name: candidate.name.clone(),
            email: format!("{}@{SEED_EMAIL_DOMAIN}", candidate.name),
            age: rng.gen_range(SEED_MIN_AGE..SEED_MAX_AGE_EXCLUSIVE),
            is_active: rng.gen_bool(0.5),
        })
        .collect()
}
