use httpmock::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use userdash_core::db::MemoryKeyValueStorage;
use userdash_core::{
    HttpSeedSource, KvUserRepository, LoadError, LoadOutcome, SeedError, SeedId, SeedSource,
    UserStore,
};

fn github_users(count: usize) -> serde_json::Value {
    serde_json::Value::Array(
        (1..=count)
            .map(|i| serde_json::json!({ "id": i, "login": format!("login{i}"), "type": "User" }))
            .collect(),
    )
}

#[test]
fn fetches_and_limits_candidates() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/users").header_exists("user-agent");
        then.status(200).json_body(github_users(30));
    });

    let source = HttpSeedSource::new(server.url("/users"), Duration::from_secs(5)).unwrap();
    let candidates = source.fetch_candidates(10).unwrap();

    mock.assert();
    assert_eq!(candidates.len(), 10);
    assert_eq!(candidates[0].id, SeedId::Number(1));
    assert_eq!(candidates[9].name, "login10");
}

#[test]
fn non_success_status_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(403).body("rate limit exceeded");
    });

    let source = HttpSeedSource::new(server.url("/users"), Duration::from_secs(5)).unwrap();
    let err = source.fetch_candidates(10).unwrap_err();

    match err {
        SeedError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("rate limit"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_body_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(200).body("<html>oops</html>");
    });

    let source = HttpSeedSource::new(server.url("/users"), Duration::from_secs(5)).unwrap();
    assert!(matches!(
        source.fetch_candidates(10),
        Err(SeedError::Decode(_))
    ));
}

#[test]
fn store_bootstraps_from_http_source() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/users");
        then.status(200).json_body(github_users(3));
    });
    let source = HttpSeedSource::new(server.url("/users"), Duration::from_secs(5)).unwrap();
    let storage = MemoryKeyValueStorage::new();

    let mut store = UserStore::new(KvUserRepository::new(&storage));
    let outcome = store.load(&source, &mut StdRng::seed_from_u64(3)).unwrap();
    assert_eq!(outcome, LoadOutcome::Seeded { count: 3 });
    assert_eq!(store.records()[2].email, "login3@example.com");

    let mut again = UserStore::new(KvUserRepository::new(&storage));
    again.load(&source, &mut StdRng::seed_from_u64(3)).unwrap();
    mock.assert_hits(1);
}

#[test]
fn unreachable_source_fails_load() {
    // Nothing listens on the discard port.
    let source =
        HttpSeedSource::new("http://127.0.0.1:9/users", Duration::from_millis(500)).unwrap();
    let storage = MemoryKeyValueStorage::new();
    let mut store = UserStore::new(KvUserRepository::new(&storage));

    let err = store.load(&source, &mut StdRng::seed_from_u64(3)).unwrap_err();

    assert!(matches!(err, LoadError::Seed(SeedError::Transport(_))));
    assert!(store.load_error().is_some());
}
