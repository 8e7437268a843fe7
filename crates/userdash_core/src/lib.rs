//! Core domain logic for the user dashboard.
//! This crate is the single source of truth for record invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;
pub mod validation;
pub mod view;

pub use crate::config::{ConfigError, DashboardConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::user::{
    SortConfig, SortDirection, SortKey, StatusFilter, StatusFilterError, UserDraft, UserId,
    UserRecord,
};
pub use repo::user_repo::{KvUserRepository, RepoError, RepoResult, UserRepository};
pub use seed::{HttpSeedSource, SeedCandidate, SeedError, SeedId, SeedSource};
pub use service::user_store::{
    LoadError, LoadOutcome, LoadState, StoreError, StoreSnapshot, SubmitOutcome, UserStore,
    LOAD_FAILED_MESSAGE,
};
pub use validation::user_form::{
    validate, validate_submission, FormField, UserForm, ValidationErrors,
};
pub use view::projection::{project, ProjectionCache};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
