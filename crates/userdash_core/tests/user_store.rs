use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::Cell;
use userdash_core::db::{DbError, DbResult, KeyValueStorage, MemoryKeyValueStorage};
use userdash_core::seed::SeedResult;
use userdash_core::{
    KvUserRepository, LoadError, LoadOutcome, LoadState, SeedCandidate, SeedError, SeedId,
    SeedSource, StoreError, SubmitOutcome, UserDraft, UserForm, UserId, UserRecord, UserStore,
    LOAD_FAILED_MESSAGE,
};

struct FakeSeed {
    candidates: Vec<SeedCandidate>,
    fail: bool,
    calls: Cell<usize>,
}

impl FakeSeed {
    fn with_count(count: i64) -> Self {
        Self {
            candidates: (1..=count)
                .map(|i| SeedCandidate::new(SeedId::Number(i), format!("user{i}")))
                .collect(),
            fail: false,
            calls: Cell::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            candidates: Vec::new(),
            fail: true,
            calls: Cell::new(0),
        }
    }
}

impl SeedSource for FakeSeed {
    fn fetch_candidates(&self, limit: usize) -> SeedResult<Vec<SeedCandidate>> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(SeedError::Transport("connection refused".to_string()));
        }
        Ok(self.candidates.iter().take(limit).cloned().collect())
    }
}

/// Reads a fixed collection; every write fails.
struct ReadOnlyStorage(String);

impl KeyValueStorage for ReadOnlyStorage {
    fn read_slot(&self, _key: &str) -> DbResult<Option<String>> {
        Ok(Some(self.0.clone()))
    }

    fn write_slot(&self, _key: &str, _value: &str) -> DbResult<()> {
        Err(DbError::UnsupportedSchemaVersion {
            db_version: 2,
            latest_supported: 1,
        })
    }
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn record(id: &str, name: &str, age: u32, active: bool) -> UserRecord {
    UserRecord {
        id: UserId::new(id),
        name: name.to_string(),
        email: format!("{}@e.com", name.to_lowercase()),
        age,
        is_active: active,
    }
}

fn stored(records: &[UserRecord]) -> MemoryKeyValueStorage {
    MemoryKeyValueStorage::with_slot("users", serde_json::to_string(records).unwrap())
}

fn ready_store(storage: &MemoryKeyValueStorage) -> UserStore<KvUserRepository<&MemoryKeyValueStorage>> {
    let mut store = UserStore::new(KvUserRepository::new(storage));
    store.load(&FakeSeed::failing(), &mut rng()).unwrap();
    store
}

fn persisted(storage: &MemoryKeyValueStorage) -> Vec<UserRecord> {
    let raw = storage.read_slot("users").unwrap().unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn load_uses_stored_collection_without_fetching() {
    let records = vec![record("1", "Bea", 30, true), record("2", "Al", 25, false)];
    let storage = stored(&records);
    let seed = FakeSeed::with_count(3);
    let mut store = UserStore::new(KvUserRepository::new(&storage));

    assert!(store.is_loading());
    let outcome = store.load(&seed, &mut rng()).unwrap();

    assert_eq!(outcome, LoadOutcome::Stored { count: 2 });
    assert_eq!(seed.calls.get(), 0);
    assert_eq!(store.records(), records.as_slice());
    assert_eq!(store.state(), &LoadState::Ready);
    assert_eq!(storage.write_count(), 0);
}

#[test]
fn empty_storage_triggers_bootstrap_once_and_persists_import() {
    let storage = MemoryKeyValueStorage::new();
    let seed = FakeSeed::with_count(12);

    let mut store = UserStore::new(KvUserRepository::new(&storage));
    let outcome = store.load(&seed, &mut rng()).unwrap();

    assert_eq!(outcome, LoadOutcome::Seeded { count: 10 });
    assert_eq!(seed.calls.get(), 1);
    assert_eq!(store.records().len(), 10);
    assert_eq!(store.records()[0].id.as_str(), "1");
    assert_eq!(store.records()[0].email, "user1@example.com");
    assert_eq!(persisted(&storage), store.records());

    // A later session finds the durable collection and never fetches again.
    for _ in 0..3 {
        let mut next = UserStore::new(KvUserRepository::new(&storage));
        next.load(&seed, &mut rng()).unwrap();
        assert_eq!(next.records().len(), 10);
    }
    assert_eq!(seed.calls.get(), 1);
}

#[test]
fn bootstrap_with_empty_source_stores_empty_collection() {
    let storage = MemoryKeyValueStorage::new();
    let seed = FakeSeed::with_count(0);
    let mut store = UserStore::new(KvUserRepository::new(&storage));

    assert_eq!(
        store.load(&seed, &mut rng()).unwrap(),
        LoadOutcome::Seeded { count: 0 }
    );
    assert_eq!(storage.read_slot("users").unwrap().as_deref(), Some("[]"));

    let mut again = UserStore::new(KvUserRepository::new(&storage));
    assert_eq!(
        again.load(&seed, &mut rng()).unwrap(),
        LoadOutcome::Stored { count: 0 }
    );
    assert_eq!(seed.calls.get(), 1);
}

#[test]
fn malformed_storage_is_treated_as_absent() {
    let storage = MemoryKeyValueStorage::with_slot("users", "{not json");
    let seed = FakeSeed::with_count(2);
    let mut store = UserStore::new(KvUserRepository::new(&storage));

    let outcome = store.load(&seed, &mut rng()).unwrap();

    assert_eq!(outcome, LoadOutcome::Seeded { count: 2 });
    assert_eq!(persisted(&storage).len(), 2);
}

#[test]
fn failed_fetch_is_fatal_and_blocks_mutations() {
    let storage = MemoryKeyValueStorage::new();
    let seed = FakeSeed::failing();
    let mut store = UserStore::new(KvUserRepository::new(&storage));

    let err = store.load(&seed, &mut rng()).unwrap_err();
    assert!(matches!(err, LoadError::Seed(SeedError::Transport(_))));
    assert_eq!(store.load_error(), Some(LOAD_FAILED_MESSAGE));
    assert!(!store.is_loading());
    assert!(store.records().is_empty());
    assert_eq!(storage.write_count(), 0);

    let snapshot = store.snapshot();
    assert!(snapshot.records.is_empty());
    assert_eq!(snapshot.load_error.as_deref(), Some(LOAD_FAILED_MESSAGE));

    let draft = UserDraft {
        name: "Al".to_string(),
        email: "a@e.com".to_string(),
        age: 25,
        is_active: true,
    };
    assert!(matches!(store.add(draft), Err(StoreError::NotReady)));
}

#[test]
fn add_appends_with_fresh_id_and_persists() {
    let storage = stored(&[record("1", "Bea", 30, true)]);
    let mut store = ready_store(&storage);

    let draft = UserDraft {
        name: "Al".to_string(),
        email: "a@e.com".to_string(),
        age: 25,
        is_active: false,
    };
    let records = store.add(draft.clone()).unwrap().to_vec();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id.as_str(), "1");
    let added = &records[1];
    assert_ne!(added.id.as_str(), "1");
    assert!(!added.id.as_str().is_empty());
    assert_eq!(UserDraft::from(added), draft);
    assert_eq!(persisted(&storage), records);
}

#[test]
fn add_then_delete_restores_original_collection() {
    let original = vec![
        record("1", "Bea", 30, true),
        record("2", "Al", 25, false),
        record("3", "Cy", 41, true),
    ];
    let storage = stored(&original);
    let mut store = ready_store(&storage);

    let draft = UserDraft {
        name: "Dee".to_string(),
        email: "d@e.com".to_string(),
        age: 33,
        is_active: true,
    };
    let new_id = store.add(draft).unwrap()[3].id.clone();
    let after = store.delete(&new_id).unwrap().to_vec();

    assert_eq!(after, original);
    assert_eq!(persisted(&storage), original);
}

#[test]
fn update_replaces_in_place_and_keeps_position() {
    let storage = stored(&[
        record("1", "Bea", 30, true),
        record("2", "Al", 25, false),
        record("3", "Cy", 41, true),
    ]);
    let mut store = ready_store(&storage);

    let mut changed = record("2", "Alan", 26, true);
    changed.email = "alan@e.com".to_string();
    let records = store.update(changed.clone()).unwrap().to_vec();

    assert_eq!(records[1], changed);
    assert_eq!(records[0].id.as_str(), "1");
    assert_eq!(records[2].id.as_str(), "3");
    assert_eq!(persisted(&storage), records);
}

#[test]
fn update_and_delete_with_unknown_id_are_noops() {
    let original = vec![record("1", "Bea", 30, true), record("2", "Al", 25, false)];
    let storage = stored(&original);
    let mut store = ready_store(&storage);
    let revision = store.revision();

    let updated = store.update(record("404", "Ghost", 99, true)).unwrap().to_vec();
    assert_eq!(updated, original);
    let deleted = store.delete(&UserId::new("404")).unwrap().to_vec();
    assert_eq!(deleted, original);

    assert_eq!(store.revision(), revision);
    assert_eq!(persisted(&storage), original);
}

#[test]
fn failed_persist_leaves_memory_unchanged() {
    let original = vec![record("1", "Bea", 30, true)];
    let storage = ReadOnlyStorage(serde_json::to_string(&original).unwrap());
    let mut store = UserStore::new(KvUserRepository::new(storage));
    store.load(&FakeSeed::failing(), &mut rng()).unwrap();

    let err = store.delete(&UserId::new("1")).unwrap_err();

    assert!(matches!(err, StoreError::Repo(_)));
    assert_eq!(store.records(), original.as_slice());
}

#[test]
fn submit_rejects_invalid_form_without_touching_storage() {
    let storage = stored(&[record("1", "Bea", 30, true)]);
    let mut store = ready_store(&storage);
    let writes = storage.write_count();

    let outcome = store
        .submit(&UserForm::new("", "nope", "-1", true), None)
        .unwrap();

    let errors = match outcome {
        SubmitOutcome::Rejected(errors) => errors,
        other => panic!("expected rejection, got {other:?}"),
    };
    assert_eq!(errors.len(), 3);
    assert_eq!(storage.write_count(), writes);
    assert_eq!(store.records().len(), 1);
}

#[test]
fn submit_adds_or_updates_depending_on_editing_id() {
    let storage = stored(&[record("1", "Bea", 30, true)]);
    let mut store = ready_store(&storage);

    let added = store
        .submit(&UserForm::new("Al", "al@e.com", "25", false), None)
        .unwrap();
    let new_id = match added {
        SubmitOutcome::Added(id) => id,
        other => panic!("expected add, got {other:?}"),
    };
    assert_eq!(store.get(&new_id).unwrap().age, 25);
    assert_eq!(store.records().last().map(|r| &r.id), Some(&new_id));
    assert_eq!(store.records().len(), 2);

    let editing = UserId::new("1");
    let mut form = UserForm::from_record(store.get(&editing).unwrap());
    form.age = "31".to_string();
    let updated = store.submit(&form, Some(&editing)).unwrap();

    assert_eq!(updated, SubmitOutcome::Updated(editing.clone()));
    assert_eq!(store.get(&editing).unwrap().age, 31);
    assert_eq!(store.records()[0].id, editing);
    assert_eq!(persisted(&storage), store.records());
}

#[test]
fn view_reflects_mutations() {
    let storage = stored(&[record("1", "Bea", 30, true), record("2", "Al", 25, false)]);
    let mut store = ready_store(&storage);
    let sort = userdash_core::SortConfig::default();

    let names: Vec<String> = store
        .view(userdash_core::StatusFilter::ALL, sort)
        .iter()
        .map(|r| r.name.clone())
        .collect();
    assert_eq!(names, vec!["Al", "Bea"]);

    store.delete(&UserId::new("2")).unwrap();
    let names: Vec<String> = store
        .view(userdash_core::StatusFilter::ALL, sort)
        .iter()
        .map(|r| r.name.clone())
        .collect();
    assert_eq!(names, vec!["Bea"]);
}
