//! User record store.
//!
//! # Responsibility
//! - Own the canonical in-memory user collection and its load state.
//! - Perform the one-time bootstrap import when storage holds no collection.
//! - Persist the full collection after every mutation.
//!
//! # Invariants
//! - Storage is written before the in-memory collection is replaced, so a
//!   failed write leaves both sides unchanged.
//! - Mutations are rejected until a load has succeeded.
//! - Updating or deleting an unknown id leaves the collection unchanged.
//! - `revision` changes whenever the collection changes.

use crate::model::user::{SortConfig, StatusFilter, UserDraft, UserId, UserRecord};
use crate::repo::user_repo::{RepoError, UserRepository};
use crate::seed::{synthesize_records, SeedError, SeedSource, SEED_LIMIT};
use crate::validation::user_form::{validate_submission, UserForm, ValidationErrors};
use crate::view::projection::ProjectionCache;
use log::{debug, error, info};
use rand::Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// User-facing message shown while the store is in the failed state.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load users. Please try again later.";

/// Fatal failure of the initial load.
#[derive(Debug)]
pub enum LoadError {
    /// Durable storage could not be read.
    Storage(RepoError),
    /// Bootstrap fetch failed or returned an unusable payload.
    Seed(SeedError),
    /// Imported records could not be written to durable storage.
    Persist(RepoError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "failed to read stored users: {err}"),
            Self::Seed(err) => write!(f, "bootstrap import failed: {err}"),
            Self::Persist(err) => write!(f, "failed to persist imported users: {err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) | Self::Persist(err) => Some(err),
            Self::Seed(err) => Some(err),
        }
    }
}

/// Error returned by store mutators.
#[derive(Debug)]
pub enum StoreError {
    /// No successful load yet (still loading or load failed).
    NotReady,
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady => write!(f, "user store is not loaded"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotReady => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Store lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    /// Carries the user-facing failure message.
    Failed(String),
}

/// Where a successful load took its records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Stored { count: usize },
    Seeded { count: usize },
}

/// Result of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Added(UserId),
    /// Returned for edit submissions, including ones whose id no longer exists.
    Updated(UserId),
    Rejected(ValidationErrors),
}

/// UI-facing view of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub records: Vec<UserRecord>,
    pub is_loading: bool,
    pub load_error: Option<String>,
}

/// Explicit state container for the user collection.
pub struct UserStore<R: UserRepository> {
    repo: R,
    records: Vec<UserRecord>,
    state: LoadState,
    revision: u64,
    projection: ProjectionCache,
}

impl<R: UserRepository> UserStore<R> {
    /// Creates an unloaded store over the given repository.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            records: Vec::new(),
            state: LoadState::Loading,
            revision: 0,
            projection: ProjectionCache::new(),
        }
    }

    /// Loads the collection from storage, importing from `seed` only when
    /// storage holds no usable collection.
    ///
    /// # Errors
    /// Returns `LoadError` and enters `LoadState::Failed` when storage cannot
    /// be read, the seed fetch fails, or imported records cannot be persisted.
    pub fn load<S, G>(&mut self, seed: &S, rng: &mut G) -> Result<LoadOutcome, LoadError>
    where
        S: SeedSource + ?Sized,
        G: Rng,
    {
        self.state = LoadState::Loading;
        match self.load_inner(seed, rng) {
            Ok((records, outcome)) => {
                self.replace_records(records);
                self.state = LoadState::Ready;
                info!("event=users_load module=store status=ok outcome={outcome:?}");
                Ok(outcome)
            }
            Err(err) => {
                error!("event=users_load module=store status=error error={err}");
                self.replace_records(Vec::new());
                self.state = LoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
                Err(err)
            }
        }
    }

    fn load_inner<S, G>(
        &self,
        seed: &S,
        rng: &mut G,
    ) -> Result<(Vec<UserRecord>, LoadOutcome), LoadError>
    where
        S: SeedSource + ?Sized,
        G: Rng,
    {
        if let Some(stored) = self.repo.read_users().map_err(LoadError::Storage)? {
            let count = stored.len();
            return Ok((stored, LoadOutcome::Stored { count }));
        }

        info!("event=users_bootstrap module=store status=start limit={SEED_LIMIT}");
        let mut candidates = seed.fetch_candidates(SEED_LIMIT).map_err(LoadError::Seed)?;
        candidates.truncate(SEED_LIMIT);
        let imported = synthesize_records(&candidates, rng);
        self.repo
            .write_users(&imported)
            .map_err(LoadError::Persist)?;

        let count = imported.len();
        info!("event=users_bootstrap module=store status=ok count={count}");
        Ok((imported, LoadOutcome::Seeded { count }))
    }

    /// Appends a new record with a freshly generated id.
    pub fn add(&mut self, draft: UserDraft) -> Result<&[UserRecord], StoreError> {
        self.append(draft)?;
        Ok(&self.records)
    }

    /// Replaces the record matching `record.id` in place.
    ///
    /// Unknown ids leave the collection unchanged.
    pub fn update(&mut self, record: UserRecord) -> Result<&[UserRecord], StoreError> {
        self.ensure_ready()?;
        let Some(position) = self.position_of(&record.id) else {
            self.repo.write_users(&self.records)?;
            debug!(
                "event=user_update module=store status=noop id={} reason=not_found",
                record.id
            );
            return Ok(&self.records);
        };

        let id = record.id.clone();
        let mut next = self.records.clone();
        next[position] = record;
        self.commit(next)?;

        info!("event=user_update module=store status=ok id={id}");
        Ok(&self.records)
    }

    /// Removes the record with `id` if present.
    pub fn delete(&mut self, id: &UserId) -> Result<&[UserRecord], StoreError> {
        self.ensure_ready()?;
        if self.position_of(id).is_none() {
            self.repo.write_users(&self.records)?;
            debug!("event=user_delete module=store status=noop id={id} reason=not_found");
            return Ok(&self.records);
        }

        let next: Vec<UserRecord> = self
            .records
            .iter()
            .filter(|record| &record.id != id)
            .cloned()
            .collect();
        self.commit(next)?;

        info!("event=user_delete module=store status=ok id={id}");
        Ok(&self.records)
    }

    /// Validates form input, then adds (no `editing` id) or updates.
    ///
    /// Rejected submissions never touch storage.
    pub fn submit(
        &mut self,
        form: &UserForm,
        editing: Option<&UserId>,
    ) -> Result<SubmitOutcome, StoreError> {
        self.ensure_ready()?;
        let draft = match validate_submission(form) {
            Ok(draft) => draft,
            Err(errors) => {
                let fields: Vec<&str> = errors.iter().map(|(field, _)| field.as_str()).collect();
                debug!(
                    "event=user_submit module=store status=rejected fields={}",
                    fields.join(",")
                );
                return Ok(SubmitOutcome::Rejected(errors));
            }
        };

        match editing {
            Some(id) => {
                self.update(draft.into_record(id.clone()))?;
                Ok(SubmitOutcome::Updated(id.clone()))
            }
            None => Ok(SubmitOutcome::Added(self.append(draft)?)),
        }
    }

    /// Returns records filtered and sorted for display.
    ///
    /// Results are memoized on `(revision, filter, sort)`.
    pub fn view(&mut self, filter: StatusFilter, sort: SortConfig) -> Vec<&UserRecord> {
        self.projection
            .ordered(&self.records, self.revision, filter, sort)
    }

    pub fn records(&self) -> &[UserRecord] {
        &self.records
    }

    pub fn get(&self, id: &UserId) -> Option<&UserRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn load_error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }

    /// Monotonic counter bumped on every collection change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            records: self.records.clone(),
            is_loading: self.is_loading(),
            load_error: self.load_error().map(str::to_string),
        }
    }

    /// Consumes the store, returning its repository.
    pub fn into_repository(self) -> R {
        self.repo
    }

    fn append(&mut self, draft: UserDraft) -> Result<UserId, StoreError> {
        self.ensure_ready()?;
        let record = draft.into_record(UserId::generate());
        let id = record.id.clone();

        let mut next = self.records.clone();
        next.push(record);
        self.commit(next)?;

        info!("event=user_add module=store status=ok id={id}");
        Ok(id)
    }

    fn ensure_ready(&self) -> Result<(), StoreError> {
        match self.state {
            LoadState::Ready => Ok(()),
            _ => Err(StoreError::NotReady),
        }
    }

    fn position_of(&self, id: &UserId) -> Option<usize> {
        self.records.iter().position(|record| &record.id == id)
    }

    fn commit(&mut self, next: Vec<UserRecord>) -> Result<(), StoreError> {
        self.repo.write_users(&next)?;
        self.replace_records(next);
        Ok(())
    }

    fn replace_records(&mut self, next: Vec<UserRecord>) {
        self.records = next;
        self.revision += 1;
    }
}
