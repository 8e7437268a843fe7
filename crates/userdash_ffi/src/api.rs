//! FFI use-case API for the Flutter dashboard.
//!
//! # Responsibility
//! - Expose load/view/submit/delete use cases to Dart via FRB.
//! - Translate core results into plain envelopes with stable meaning.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every store call runs under one process-wide lock, so read-modify-write
//!   cycles from concurrent Dart isolates never interleave.
//! - The initial load runs once per process. Its outcome is latched; a failed
//!   load is reported by every later call until `users_reload` is invoked.

use log::{info, warn};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use userdash_core::db::{open_db, SqliteKeyValueStorage};
use userdash_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, DashboardConfig,
    HttpSeedSource, KvUserRepository, SeedCandidate, SeedError, SeedSource, SortConfig,
    SortDirection, SortKey, StatusFilter, StoreSnapshot, SubmitOutcome, UserForm, UserId,
    UserRecord, UserStore, LOAD_FAILED_MESSAGE,
};
use userdash_core::seed::SeedResult;

static DASHBOARD_CONFIG: OnceLock<DashboardConfig> = OnceLock::new();
/// Latched outcome of the session load; `None` until the first store call.
static STORE_LOCK: Mutex<Option<Result<(), String>>> = Mutex::new(None);

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Sync call; may create the log directory.
/// - Idempotent for the same `level + log_dir`; conflicts return an error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the database file used by every later call.
///
/// Must run before the first store call to take effect. Returns empty string
/// on success (including a repeated call with the same path).
#[flutter_rust_bridge::frb(sync)]
pub fn configure_db_path(db_path: String) -> String {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return "db_path cannot be empty".to_string();
    }
    let requested = PathBuf::from(trimmed);
    let active = DASHBOARD_CONFIG.get_or_init(|| DashboardConfig {
        db_path: requested.clone(),
        ..load_config()
    });
    if active.db_path == requested {
        String::new()
    } else {
        format!(
            "db_path already configured as `{}`",
            active.db_path.display()
        )
    }
}

/// One user row as shown by the dashboard table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserItem {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: u32,
    pub is_active: bool,
}

/// Store state envelope: `records`, `is_loading`, `load_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersState {
    pub records: Vec<UserItem>,
    pub is_loading: bool,
    /// User-facing blocking message when the initial load failed.
    pub load_error: Option<String>,
}

/// Projected table rows for the current filter and sort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsersView {
    pub ordered_records: Vec<UserItem>,
    pub load_error: Option<String>,
}

/// Active sort column and direction (`asc|desc`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub key: String,
    pub direction: String,
}

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Result of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub ok: bool,
    /// Id of the added/updated record on success.
    pub user_id: Option<String>,
    /// Field errors to show next to inputs; empty on success.
    pub errors: Vec<FieldError>,
    pub message: String,
}

/// Generic action result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

/// Loads the collection, importing seed users on first run.
///
/// # FFI contract
/// - Async call: first run performs a network fetch bounded by the seed
///   timeout.
/// - Never panics; failures are reported through `load_error`.
pub fn users_load() -> UsersState {
    match with_store(|store| Ok(store.snapshot())) {
        Ok(snapshot) => to_users_state(snapshot),
        Err(message) => UsersState {
            records: Vec::new(),
            is_loading: false,
            load_error: Some(message),
        },
    }
}

/// Discards a latched load failure and runs the initial load again.
///
/// # FFI contract
/// - Async call: performs the bootstrap fetch again when storage is empty.
/// - A successful earlier load is kept; the stored collection is returned.
pub fn users_reload() -> UsersState {
    match run_store(true, |store| Ok(store.snapshot())) {
        Ok(snapshot) => to_users_state(snapshot),
        Err(message) => UsersState {
            records: Vec::new(),
            is_loading: false,
            load_error: Some(message),
        },
    }
}

/// Returns records filtered by status and ordered by the given sort.
///
/// `status` is the select value (`""`, `"true"`, `"false"`); unknown sort
/// keys/directions fall back to `name`/`asc`.
pub fn users_view(status: String, sort_key: String, sort_direction: String) -> UsersView {
    let filter = match StatusFilter::parse(&status) {
        Ok(filter) => filter,
        Err(err) => {
            return UsersView {
                ordered_records: Vec::new(),
                load_error: Some(err.to_string()),
            }
        }
    };
    let sort = parse_sort(&sort_key, &sort_direction);

    match with_store(|store| {
        if let Some(message) = store.load_error() {
            return Err(message.to_string());
        }
        Ok(store
            .view(filter, sort)
            .into_iter()
            .map(to_user_item)
            .collect::<Vec<_>>())
    }) {
        Ok(ordered_records) => UsersView {
            ordered_records,
            load_error: None,
        },
        Err(message) => UsersView {
            ordered_records: Vec::new(),
            load_error: Some(message),
        },
    }
}

/// Computes the sort state after clicking the `clicked_key` column header.
#[flutter_rust_bridge::frb(sync)]
pub fn sort_toggle(current_key: String, current_direction: String, clicked_key: String) -> SortState {
    let current = parse_sort(&current_key, &current_direction);
    let next = SortKey::parse(&clicked_key).map_or(current, |key| current.toggled(key));
    SortState {
        key: next.key.as_str().to_string(),
        direction: next.direction.as_str().to_string(),
    }
}

/// Validates form input and adds (no `editing_id`) or updates a user.
///
/// # FFI contract
/// - Validation failures return `ok=false` with every violated field.
/// - Never panics.
pub fn users_submit(
    name: String,
    email: String,
    age: String,
    is_active: bool,
    editing_id: Option<String>,
) -> SubmitResponse {
    let form = UserForm::new(name, email, age, is_active);
    let editing = editing_id.map(UserId::new);

    match with_store(|store| {
        store
            .submit(&form, editing.as_ref())
            .map_err(|err| err.to_string())
    }) {
        Ok(SubmitOutcome::Added(id)) => SubmitResponse::success("User added.", id),
        Ok(SubmitOutcome::Updated(id)) => SubmitResponse::success("User updated.", id),
        Ok(SubmitOutcome::Rejected(errors)) => SubmitResponse {
            ok: false,
            user_id: None,
            errors: errors
                .iter()
                .map(|(field, message)| FieldError {
                    field: field.as_str().to_string(),
                    message: message.to_string(),
                })
                .collect(),
            message: "Please fix the highlighted fields.".to_string(),
        },
        Err(message) => SubmitResponse {
            ok: false,
            user_id: None,
            errors: Vec::new(),
            message: format!("users_submit failed: {message}"),
        },
    }
}

/// Deletes a user by id; unknown ids succeed without changes.
pub fn users_delete(id: String) -> ActionResponse {
    let id = UserId::new(id);
    match with_store(|store| store.delete(&id).map(|_| ()).map_err(|err| err.to_string())) {
        Ok(()) => ActionResponse {
            ok: true,
            message: "User deleted.".to_string(),
        },
        Err(message) => ActionResponse {
            ok: false,
            message: format!("users_delete failed: {message}"),
        },
    }
}

impl SubmitResponse {
    fn success(message: &str, id: UserId) -> Self {
        Self {
            ok: true,
            user_id: Some(id.to_string()),
            errors: Vec::new(),
            message: message.to_string(),
        }
    }
}

type SqliteStore<'conn> = UserStore<KvUserRepository<SqliteKeyValueStorage<'conn>>>;

fn with_store<T>(f: impl FnOnce(&mut SqliteStore<'_>) -> Result<T, String>) -> Result<T, String> {
    run_store(false, f)
}

fn run_store<T>(
    reload: bool,
    f: impl FnOnce(&mut SqliteStore<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let mut latched = STORE_LOCK
        .lock()
        .map_err(|_| "store lock poisoned".to_string())?;
    if reload && matches!(latched.as_ref(), Some(Err(_))) {
        info!("event=users_reload module=ffi status=start");
        *latched = None;
    }
    if let Some(Err(message)) = latched.as_ref() {
        return Err(message.clone());
    }

    let config = dashboard_config();
    let conn = open_db(&config.db_path).map_err(|err| format!("DB open failed: {err}"))?;
    let repo = KvUserRepository::with_key(SqliteKeyValueStorage::new(&conn), &config.storage_key);
    let mut store = UserStore::new(repo);

    let loaded = if latched.is_some() {
        store.load(&ImportDone, &mut rand::thread_rng())
    } else {
        let seed = HttpSeedSource::new(&config.seed_url, config.seed_timeout())
            .map_err(|err| format!("seed source init failed: {err}"))?;
        store.load(&seed, &mut rand::thread_rng())
    };
    let outcome = match loaded {
        Ok(_) => Ok(()),
        Err(_) => Err(store.load_error().unwrap_or(LOAD_FAILED_MESSAGE).to_string()),
    };
    *latched = Some(outcome.clone());
    outcome?;

    f(&mut store)
}

/// Seed source used once the session load has succeeded; the collection is
/// durable by then and is never imported twice.
struct ImportDone;

impl SeedSource for ImportDone {
    fn fetch_candidates(&self, _limit: usize) -> SeedResult<Vec<SeedCandidate>> {
        Err(SeedError::Transport(
            "bootstrap import already completed in this session".to_string(),
        ))
    }
}

fn dashboard_config() -> &'static DashboardConfig {
    DASHBOARD_CONFIG.get_or_init(load_config)
}

fn load_config() -> DashboardConfig {
    DashboardConfig::from_env().unwrap_or_else(|err| {
        warn!("event=config_load module=ffi status=fallback error={err}");
        DashboardConfig::default()
    })
}

fn parse_sort(key: &str, direction: &str) -> SortConfig {
    let fallback = SortConfig::default();
    SortConfig::new(
        SortKey::parse(key).unwrap_or(fallback.key),
        SortDirection::parse(direction).unwrap_or(fallback.direction),
    )
}

fn to_users_state(snapshot: StoreSnapshot) -> UsersState {
    UsersState {
        records: snapshot.records.iter().map(to_user_item).collect(),
        is_loading: snapshot.is_loading,
        load_error: snapshot.load_error,
    }
}

fn to_user_item(record: &UserRecord) -> UserItem {
    UserItem {
        id: record.id.to_string(),
        name: record.name.clone(),
        email: record.email.clone(),
        age: record.age,
        is_active: record.is_active,
    }
}
